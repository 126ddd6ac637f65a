//! Event recorder bound to the status record.
//!
//! Events are attached to whichever status record the recorder currently
//! references. The reference is swapped by [`StatusWriter`](crate::StatusWriter)
//! after each successful write, so a failed write leaves the previous
//! reference in place and the next cycle simply tries again.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use fabricscale_state::StatusRecord;
use tracing::{info, warn};

/// Default number of events kept in memory.
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub record_name: String,
    pub record_version: u64,
    pub event_type: EventType,
    pub reason: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LogEventRecorder {
    active: bool,
    status_record: Option<StatusRecord>,
    events: VecDeque<RecordedEvent>,
    capacity: usize,
}

impl LogEventRecorder {
    /// A recorder that drops events while `active` is false.
    pub fn new(active: bool) -> Self {
        Self::with_capacity(active, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(active: bool, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            active,
            status_record: None,
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an event against the current status record. Events are
    /// dropped when inactive or when no record has been written yet.
    pub fn event(&mut self, event_type: EventType, reason: &str, message: &str) {
        if !self.active {
            return;
        }
        let Some(record) = &self.status_record else {
            return;
        };

        match event_type {
            EventType::Normal => info!(record = %record.name, %reason, "{message}"),
            EventType::Warning => warn!(record = %record.name, %reason, "{message}"),
        }

        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(RecordedEvent {
            record_name: record.name.clone(),
            record_version: record.version,
            event_type,
            reason: reason.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn status_record(&self) -> Option<&StatusRecord> {
        self.status_record.as_ref()
    }

    pub(crate) fn set_status_record(&mut self, record: StatusRecord) {
        self.status_record = Some(record);
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.events.iter()
    }
}
