//! fabricscale-status — reports scale-up outcomes to a named status record.
//!
//! ```text
//! ScaleUpStatus ──aggregate──▶ ScaleUpStatusReport ──StatusWriter──▶ RecordStore
//!                                                          │
//!                                                          └─▶ LogEventRecorder (on success)
//! ```
//!
//! Aggregation folds every unschedulable pod batch into one reason histogram
//! per node group. The writer serializes the report to YAML and stores it in
//! the record's `status` field with a last-updated annotation, creating the
//! record when it does not exist yet.

pub mod aggregate;
pub mod error;
pub mod persist;
pub mod processor;
pub mod recorder;
pub mod scale_up;

pub use aggregate::{NodeGroupScaleUpCondition, NodeGroupStatus, ScaleUpStatusReport, aggregate};
pub use error::{StatusError, StatusResult};
pub use persist::{
    LAST_UPDATED_ANNOTATION, LAST_UPDATE_FORMAT, STATUS_DATA_KEY, StatusPayload, StatusWriter,
    format_last_updated, parse_last_updated,
};
pub use processor::{ConfigmapScaleUpStatusProcessor, ScaleUpStatusProcessor, StatusContext};
pub use recorder::{EventType, LogEventRecorder, RecordedEvent};
pub use scale_up::{ScaleUpResult, ScaleUpStatus, SkippedReasons, UnschedulablePodGroup};
