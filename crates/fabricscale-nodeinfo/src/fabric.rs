//! Fabric attribution — deduplicate templates by node group and drop
//! locally-attached device inventory for fabric-backed groups.
//!
//! Devices on a composable fabric are reachable from many nodes. If a group's
//! template kept the representative node's local resource slices, the
//! simulator would count those shared devices as capacity every new node
//! brings with it. Fabric-backed groups are instead resolved against the
//! fabric's own resource slices, so their templates carry none.
//!
//! # Representative node
//!
//! Nodes are visited in input order and the first node resolved to a group
//! decides that group's treatment. Later nodes of the same group are
//! ignored, even when their fabric label differs. Output is therefore a
//! function of node order; callers that need it to be order-independent
//! sort the node list first (see [`sort_nodes_by_name`]).

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use fabricscale_core::DEFAULT_FABRIC_LABEL_KEY;

use crate::error::AutoscalerResult;
use crate::provider::TemplateNodeInfoProvider;
use crate::resolver::NodeGroupResolver;
use crate::types::{DaemonSet, Node, TaintConfig, TemplateSet};

/// True if the node carries `label_key`, whatever its value.
pub fn is_fabric_attached(node: &Node, label_key: &str) -> bool {
    node.labels.contains_key(label_key)
}

/// Sort nodes by name so the first-seen representative is stable across
/// cycles regardless of listing order.
pub fn sort_nodes_by_name(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Wraps a base provider and corrects its output for fabric-attached devices.
pub struct FabricNodeInfoProvider {
    inner: Box<dyn TemplateNodeInfoProvider + Send>,
    fabric_label_key: String,
}

impl FabricNodeInfoProvider {
    pub fn new(inner: Box<dyn TemplateNodeInfoProvider + Send>) -> Self {
        Self::with_label_key(inner, DEFAULT_FABRIC_LABEL_KEY)
    }

    pub fn with_label_key(
        inner: Box<dyn TemplateNodeInfoProvider + Send>,
        fabric_label_key: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            fabric_label_key: fabric_label_key.into(),
        }
    }
}

impl TemplateNodeInfoProvider for FabricNodeInfoProvider {
    fn process(
        &mut self,
        resolver: &dyn NodeGroupResolver,
        nodes: &[Node],
        daemonsets: &[DaemonSet],
        taint_config: &TaintConfig,
        now: DateTime<Utc>,
    ) -> AutoscalerResult<TemplateSet> {
        let mut base = self
            .inner
            .process(resolver, nodes, daemonsets, taint_config, now)?;

        let mut result = TemplateSet::new();
        for node in nodes {
            // A lookup failure aborts the whole pass; nothing partial escapes.
            let group_id = match resolver.node_group_for_node(node)? {
                Some(id) if !id.is_empty() => id,
                _ => continue,
            };
            if result.contains_key(&group_id) {
                continue;
            }

            let Some(mut template) = base.remove(&group_id) else {
                warn!(
                    node = %node.name,
                    node_group = %group_id,
                    "base provider returned no template for node group"
                );
                continue;
            };

            if is_fabric_attached(node, &self.fabric_label_key) {
                debug!(
                    node = %node.name,
                    node_group = %group_id,
                    slices = template.local_resource_slices.len(),
                    "fabric-attached representative, dropping local resource slices"
                );
                template.local_resource_slices.clear();
            }
            result.insert(group_id, template);
        }

        debug!(
            nodes = nodes.len(),
            node_groups = result.len(),
            "fabric attribution complete"
        );
        Ok(result)
    }

    fn clean_up(&mut self) {
        self.inner.clean_up();
    }
}
