//! Template providers.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::AutoscalerResult;
use crate::resolver::NodeGroupResolver;
use crate::types::{DaemonSet, Node, TaintConfig, TemplateSet};

/// Produces one template per node group for the current cluster state.
pub trait TemplateNodeInfoProvider {
    fn process(
        &mut self,
        resolver: &dyn NodeGroupResolver,
        nodes: &[Node],
        daemonsets: &[DaemonSet],
        taint_config: &TaintConfig,
        now: DateTime<Utc>,
    ) -> AutoscalerResult<TemplateSet>;

    /// Release internal caches. Safe to call repeatedly.
    fn clean_up(&mut self);
}

/// Serves a fixed, precomputed template set.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplateProvider {
    templates: TemplateSet,
}

impl StaticTemplateProvider {
    pub fn new(templates: TemplateSet) -> Self {
        Self { templates }
    }
}

impl TemplateNodeInfoProvider for StaticTemplateProvider {
    fn process(
        &mut self,
        _resolver: &dyn NodeGroupResolver,
        nodes: &[Node],
        _daemonsets: &[DaemonSet],
        _taint_config: &TaintConfig,
        _now: DateTime<Utc>,
    ) -> AutoscalerResult<TemplateSet> {
        debug!(
            nodes = nodes.len(),
            templates = self.templates.len(),
            "serving static templates"
        );
        Ok(self.templates.clone())
    }

    fn clean_up(&mut self) {}
}
