//! Writes a status payload into a named record, creating it if absent.
//!
//! Each attempt reads the record, replaces its `status` data entry and
//! last-updated annotation, and writes it back conditioned on the version
//! it read. Every other data entry and annotation is carried over
//! untouched. When another writer changed the record in between, the store
//! rejects the write and the whole read-modify-write is repeated, up to
//! `max_attempts` times. Any other failure ends the call; the next
//! reporting cycle is the retry.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use fabricscale_state::{RecordStore, StateError, StateResult, StatusRecord};

use crate::error::{StatusError, StatusResult};
use crate::recorder::LogEventRecorder;

/// Data key holding the serialized payload.
pub const STATUS_DATA_KEY: &str = "status";

/// Annotation holding the time of the last successful write.
pub const LAST_UPDATED_ANNOTATION: &str = "cluster-autoscaler.kubernetes.io/last-updated";

/// `chrono` format of the last-updated annotation, e.g.
/// `2026-10-18 09:30:00.123456789 +0000`.
pub const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f %z";

/// A payload that carries its own update time.
pub trait StatusPayload: Serialize {
    fn set_time(&mut self, time: &str);
}

pub fn format_last_updated(time: DateTime<Utc>) -> String {
    time.format(LAST_UPDATE_FORMAT).to_string()
}

pub fn parse_last_updated(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, LAST_UPDATE_FORMAT).ok()
}

pub struct StatusWriter<'a> {
    store: &'a dyn RecordStore,
    namespace: String,
    max_attempts: u32,
}

impl<'a> StatusWriter<'a> {
    pub fn new(store: &'a dyn RecordStore, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            max_attempts: 3,
        }
    }

    /// Bound on read-modify-write attempts lost to concurrent writers.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Stamp `status` with `now`, serialize it and store it in record
    /// `name`. On success the recorder, if any, is pointed at the stored
    /// record and the stored record is returned.
    pub fn write<P: StatusPayload>(
        &self,
        status: &mut P,
        recorder: Option<&mut LogEventRecorder>,
        name: &str,
        now: DateTime<Utc>,
    ) -> StatusResult<StatusRecord> {
        let update_time = format_last_updated(now);
        status.set_time(&update_time);
        let body =
            serde_yaml::to_string(status).map_err(|e| StatusError::Serialize(e.to_string()))?;

        let mut attempt = 1;
        let stored = loop {
            match self.write_once(name, &body, &update_time) {
                Ok(stored) => break stored,
                Err(AttemptError::Conflict(err)) if attempt < self.max_attempts => {
                    warn!(
                        record = name,
                        attempt,
                        error = %err,
                        "status record changed concurrently, retrying"
                    );
                    attempt += 1;
                }
                Err(AttemptError::Conflict(_)) => {
                    return Err(StatusError::ConflictRetriesExhausted {
                        name: name.to_string(),
                        attempts: self.max_attempts,
                    });
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
            }
        };

        debug!(
            record = name,
            version = stored.version,
            body = %body,
            "successfully wrote status record"
        );
        if let Some(recorder) = recorder {
            recorder.set_status_record(stored.clone());
        }
        Ok(stored)
    }

    fn write_once(
        &self,
        name: &str,
        body: &str,
        update_time: &str,
    ) -> Result<StatusRecord, AttemptError> {
        let fetched = self.store.get_record(&self.namespace, name);
        let result: StateResult<StatusRecord> = match fetched {
            Ok(mut record) => {
                stamp(&mut record, body, update_time);
                self.store.update_record(&record)
            }
            Err(err) if err.is_not_found() => {
                let mut record = StatusRecord::new(&self.namespace, name);
                stamp(&mut record, body, update_time);
                self.store.create_record(&record)
            }
            Err(source) => {
                return Err(AttemptError::Fatal(StatusError::Fetch {
                    name: name.to_string(),
                    source,
                }));
            }
        };

        result.map_err(|source| {
            if source.is_conflict() {
                AttemptError::Conflict(source)
            } else {
                AttemptError::Fatal(StatusError::Write {
                    name: name.to_string(),
                    source,
                })
            }
        })
    }
}

/// Outcome of one failed read-modify-write attempt.
enum AttemptError {
    Conflict(StateError),
    Fatal(StatusError),
}

fn stamp(record: &mut StatusRecord, body: &str, update_time: &str) {
    record
        .data
        .insert(STATUS_DATA_KEY.to_string(), body.to_string());
    record
        .annotations
        .insert(LAST_UPDATED_ANNOTATION.to_string(), update_time.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{NodeGroupScaleUpCondition, NodeGroupStatus, ScaleUpStatusReport};
    use chrono::TimeZone;
    use fabricscale_state::StateStore;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    const NS: &str = "kube-system";
    const NAME: &str = "ca-status-scaleup";

    /// Wraps a real store and injects failures or a competing writer.
    struct TestStore {
        inner: StateStore,
        fail_get: bool,
        fail_write: bool,
        /// Number of upcoming fetches after which another writer bumps the record.
        interfere: Cell<u32>,
        /// When set, another writer creates the record right after the next
        /// fetch reports it missing.
        race_create: Cell<bool>,
        calls: Cell<u32>,
    }

    impl TestStore {
        fn new() -> Self {
            Self {
                inner: StateStore::open_in_memory().unwrap(),
                fail_get: false,
                fail_write: false,
                interfere: Cell::new(0),
                race_create: Cell::new(false),
                calls: Cell::new(0),
            }
        }
    }

    impl RecordStore for TestStore {
        fn get_record(&self, namespace: &str, name: &str) -> StateResult<StatusRecord> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_get {
                return Err(StateError::Read("connection refused".to_string()));
            }
            let record = match self.inner.get_record(namespace, name) {
                Err(err) if err.is_not_found() && self.race_create.replace(false) => {
                    let mut theirs = StatusRecord::new(namespace, name);
                    theirs.data.insert("other-writer".to_string(), "was here".to_string());
                    self.inner.create_record(&theirs)?;
                    return Err(err);
                }
                fetched => fetched?,
            };
            if self.interfere.get() > 0 {
                self.interfere.set(self.interfere.get() - 1);
                let mut theirs = record.clone();
                theirs.data.insert("other-writer".to_string(), "was here".to_string());
                self.inner.update_record(&theirs)?;
            }
            Ok(record)
        }

        fn create_record(&self, record: &StatusRecord) -> StateResult<StatusRecord> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_write {
                return Err(StateError::Write("quota exceeded".to_string()));
            }
            self.inner.create_record(record)
        }

        fn update_record(&self, record: &StatusRecord) -> StateResult<StatusRecord> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_write {
                return Err(StateError::Write("quota exceeded".to_string()));
            }
            self.inner.update_record(record)
        }
    }

    fn report(reason: &str, count: u32) -> ScaleUpStatusReport {
        ScaleUpStatusReport {
            time: String::new(),
            result: "no_options_available".to_string(),
            node_groups: vec![NodeGroupStatus {
                name: "gpu-pool".to_string(),
                scale_up: NodeGroupScaleUpCondition {
                    reasons: BTreeMap::from([(reason.to_string(), count)]),
                },
            }],
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn decode(record: &StatusRecord) -> ScaleUpStatusReport {
        serde_yaml::from_str(&record.data[STATUS_DATA_KEY]).unwrap()
    }

    #[test]
    fn creates_absent_record() {
        let store = TestStore::new();
        let mut payload = report("InsufficientResources", 2);

        let stored = StatusWriter::new(&store, NS)
            .write(&mut payload, None, NAME, at(1_000))
            .unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(decode(&stored), payload);
        assert_eq!(payload.time, format_last_updated(at(1_000)));
        assert_eq!(
            stored.annotations[LAST_UPDATED_ANNOTATION],
            format_last_updated(at(1_000))
        );
        assert_eq!(store.inner.get_record(NS, NAME).unwrap(), stored);
    }

    #[test]
    fn updates_existing_record_and_preserves_other_fields() {
        let store = TestStore::new();
        let writer = StatusWriter::new(&store, NS);
        writer
            .write(&mut report("InsufficientResources", 2), None, NAME, at(1_000))
            .unwrap();

        // Someone else annotates the record between cycles.
        let mut record = store.inner.get_record(NS, NAME).unwrap();
        record.annotations.insert("owner".to_string(), "sre".to_string());
        record.data.insert("notes".to_string(), "keep me".to_string());
        store.inner.update_record(&record).unwrap();

        let mut second = report("NodeAffinity", 1);
        let stored = writer.write(&mut second, None, NAME, at(2_000)).unwrap();

        assert_eq!(decode(&stored), second);
        assert_eq!(stored.annotations["owner"], "sre");
        assert_eq!(stored.data["notes"], "keep me");
        let last_updated = parse_last_updated(&stored.annotations[LAST_UPDATED_ANNOTATION]).unwrap();
        assert_eq!(last_updated, at(2_000));
        assert_eq!(stored.version, 3);
    }

    #[test]
    fn last_updated_round_trips_subsecond_precision() {
        let time = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let text = format_last_updated(time);
        assert_eq!(text, "2023-11-14 22:13:20.123456789 +0000");
        assert_eq!(parse_last_updated(&text).unwrap(), time);
        assert!(parse_last_updated("yesterday").is_none());
    }

    #[test]
    fn recorder_updated_only_on_success() {
        let mut store = TestStore::new();
        let mut recorder = LogEventRecorder::new(true);

        store.fail_write = true;
        let err = StatusWriter::new(&store, NS)
            .write(&mut report("a", 1), Some(&mut recorder), NAME, at(1_000))
            .unwrap_err();
        assert!(matches!(err, StatusError::Write { .. }));
        assert!(recorder.status_record().is_none());

        store.fail_write = false;
        let stored = StatusWriter::new(&store, NS)
            .write(&mut report("a", 1), Some(&mut recorder), NAME, at(1_000))
            .unwrap();
        assert_eq!(recorder.status_record(), Some(&stored));
    }

    #[test]
    fn fetch_failure_skips_write() {
        let mut store = TestStore::new();
        store.fail_get = true;

        let err = StatusWriter::new(&store, NS)
            .write(&mut report("a", 1), None, NAME, at(1_000))
            .unwrap_err();

        assert!(matches!(err, StatusError::Fetch { .. }));
        assert_eq!(store.calls.get(), 1);
        assert!(store.inner.list_records(NS).unwrap().is_empty());
    }

    #[test]
    fn write_failure_is_not_retried() {
        let mut store = TestStore::new();
        store.fail_write = true;

        let err = StatusWriter::new(&store, NS)
            .write(&mut report("a", 1), None, NAME, at(1_000))
            .unwrap_err();

        assert!(matches!(err, StatusError::Write { .. }));
        assert_eq!(store.calls.get(), 2);
    }

    #[test]
    fn serialization_failure_makes_no_store_call() {
        struct Unserializable;

        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cyclic payload"))
            }
        }

        impl StatusPayload for Unserializable {
            fn set_time(&mut self, _time: &str) {}
        }

        let store = TestStore::new();
        let err = StatusWriter::new(&store, NS)
            .write(&mut Unserializable, None, NAME, at(1_000))
            .unwrap_err();

        assert!(matches!(err, StatusError::Serialize(_)));
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn concurrent_writer_triggers_retry() {
        let store = TestStore::new();
        let writer = StatusWriter::new(&store, NS);
        writer
            .write(&mut report("a", 1), None, NAME, at(1_000))
            .unwrap();

        store.interfere.set(1);
        let mut payload = report("b", 2);
        let stored = writer.write(&mut payload, None, NAME, at(2_000)).unwrap();

        assert_eq!(decode(&stored), payload);
        // The competing writer's change survives the retried merge.
        assert_eq!(stored.data["other-writer"], "was here");
        assert_eq!(stored.version, 3);
    }

    #[test]
    fn create_race_retries_as_update() {
        let store = TestStore::new();
        store.race_create.set(true);

        let mut payload = report("a", 1);
        let stored = StatusWriter::new(&store, NS)
            .write(&mut payload, None, NAME, at(5))
            .unwrap();

        assert!(!store.race_create.get());
        assert_eq!(stored.version, 2);
        assert_eq!(decode(&stored), payload);
        assert_eq!(stored.data["other-writer"], "was here");
        assert_eq!(
            stored.annotations[LAST_UPDATED_ANNOTATION],
            "1970-01-01 00:00:05.000000000 +0000"
        );
        // fetch, create (rejected), fetch, update
        assert_eq!(store.calls.get(), 4);
    }

    #[test]
    fn conflict_retries_are_bounded() {
        let store = TestStore::new();
        let writer = StatusWriter::new(&store, NS).with_max_attempts(2);
        writer
            .write(&mut report("a", 1), None, NAME, at(1_000))
            .unwrap();

        store.interfere.set(5);
        let err = writer
            .write(&mut report("b", 1), None, NAME, at(2_000))
            .unwrap_err();

        assert!(matches!(
            err,
            StatusError::ConflictRetriesExhausted { attempts: 2, .. }
        ));
        assert_eq!(store.interfere.get(), 3);
    }
}
