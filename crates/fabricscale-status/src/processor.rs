//! Scale-up status processors run at the end of each scale-up attempt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use fabricscale_core::StatusConfig;
use fabricscale_state::RecordStore;

use crate::aggregate::aggregate;
use crate::persist::StatusWriter;
use crate::recorder::LogEventRecorder;
use crate::scale_up::ScaleUpStatus;

/// What a processor needs from the surrounding control loop.
pub struct StatusContext {
    pub store: Arc<dyn RecordStore + Send + Sync>,
    pub config: StatusConfig,
    pub recorder: LogEventRecorder,
}

impl StatusContext {
    pub fn new(store: Arc<dyn RecordStore + Send + Sync>, config: StatusConfig) -> Self {
        Self {
            store,
            config,
            recorder: LogEventRecorder::new(true),
        }
    }
}

pub trait ScaleUpStatusProcessor {
    fn process(&mut self, ctx: &mut StatusContext, status: &ScaleUpStatus, now: DateTime<Utc>);

    fn clean_up(&mut self);
}

/// Publishes the per-node-group skip histogram to `{record_name}-scaleup`.
///
/// Write failures are logged and swallowed: a stale report is acceptable
/// and the next attempt overwrites it.
#[derive(Debug, Default)]
pub struct ConfigmapScaleUpStatusProcessor;

impl ScaleUpStatusProcessor for ConfigmapScaleUpStatusProcessor {
    fn process(&mut self, ctx: &mut StatusContext, status: &ScaleUpStatus, now: DateTime<Utc>) {
        let mut report = aggregate(status);
        let name = ctx.config.scale_up_record_name();
        debug!(
            record = %name,
            result = %report.result,
            node_groups = report.node_groups.len(),
            "publishing scale-up status"
        );

        let writer = StatusWriter::new(&*ctx.store, ctx.config.namespace.as_str())
            .with_max_attempts(ctx.config.max_write_attempts);
        if let Err(e) = writer.write(&mut report, Some(&mut ctx.recorder), &name, now) {
            error!(record = %name, error = %e, "failed to write scale-up status");
        }
    }

    fn clean_up(&mut self) {}
}
