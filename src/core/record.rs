//! Transition records and the in-memory transition log.
//!
//! Records capture state *names* rather than state values: behavior states
//! are live objects, so the serializable part of a transition is the pair
//! of names plus the time it happened.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many records a [`TransitionLog`] keeps before dropping the oldest.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Record of a single accepted transition.
///
/// `from` is `None` for the initial transition performed by `init`, where
/// no state is exited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the state that was exited, if any.
    pub from: Option<String>,
    /// Name of the state that was entered.
    pub to: String,
    /// When the transition was applied.
    pub timestamp: DateTime<Utc>,
}

/// Capacity-bounded, in-memory log of accepted transitions.
///
/// The log is an ordinary value; to feed it from a machine, wrap it with
/// [`shared`](TransitionLog::shared) and register the handle as an
/// observer. Once the capacity is exceeded the oldest record is dropped,
/// so [`path`](TransitionLog::path) and [`duration`](TransitionLog::duration)
/// describe the retained window.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use stance::{TransitionLog, TransitionRecord};
///
/// let mut log = TransitionLog::new();
/// log.record(TransitionRecord {
///     from: None,
///     to: "idle".to_string(),
///     timestamp: Utc::now(),
/// });
/// log.record(TransitionRecord {
///     from: Some("idle".to_string()),
///     to: "running".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(log.len(), 2);
/// assert_eq!(log.path(), vec!["idle", "running"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionLog {
    records: Vec<TransitionRecord>,
    capacity: usize,
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionLog {
    /// Create an empty log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Create an empty log that retains at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }

    /// Create a log behind a shared handle.
    ///
    /// The returned handle implements
    /// [`StateObserver`](crate::machine::StateObserver), so a clone of it
    /// can be registered on a machine while the caller keeps this one for
    /// reading.
    pub fn shared(capacity: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::with_capacity(capacity)))
    }

    /// Append a record, dropping the oldest if the log is full.
    pub fn record(&mut self, record: TransitionRecord) {
        self.records.push(record);
        if self.records.len() > self.capacity {
            self.records.remove(0);
        }
    }

    /// All retained records, oldest first.
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// The sequence of state names traversed by the retained records.
    ///
    /// Starts with the first record's `from` name when present, then the
    /// `to` name of every record in order.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            if let Some(from) = &first.from {
                path.push(from.as_str());
            }
        }
        for record in &self.records {
            path.push(record.to.as_str());
        }
        path
    }

    /// Elapsed time between the first and last retained record.
    ///
    /// Returns `None` while the log is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            let elapsed = last.timestamp.signed_duration_since(first.timestamp);
            elapsed.to_std().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from: Option<&str>, to: &str) -> TransitionRecord {
        TransitionRecord {
            from: from.map(str::to_string),
            to: to.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_log_is_empty() {
        let log = TransitionLog::new();
        assert!(log.is_empty());
        assert!(log.path().is_empty());
        assert!(log.duration().is_none());
    }

    #[test]
    fn record_appends_in_order() {
        let mut log = TransitionLog::new();
        log.record(record(None, "idle"));
        log.record(record(Some("idle"), "running"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].to, "idle");
        assert_eq!(log.records()[1].to, "running");
    }

    #[test]
    fn path_chains_names_through_the_initial_transition() {
        let mut log = TransitionLog::new();
        log.record(record(None, "idle"));
        log.record(record(Some("idle"), "running"));
        log.record(record(Some("running"), "attacking"));

        assert_eq!(log.path(), vec!["idle", "running", "attacking"]);
    }

    #[test]
    fn capacity_drops_oldest_records() {
        let mut log = TransitionLog::with_capacity(2);
        log.record(record(None, "a"));
        log.record(record(Some("a"), "b"));
        log.record(record(Some("b"), "c"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].to, "b");
        assert_eq!(log.records()[1].to, "c");
    }

    #[test]
    fn duration_spans_first_to_last() {
        let start = Utc::now();
        let mut log = TransitionLog::new();
        log.record(TransitionRecord {
            from: None,
            to: "a".to_string(),
            timestamp: start,
        });
        log.record(TransitionRecord {
            from: Some("a".to_string()),
            to: "b".to_string(),
            timestamp: start + chrono::Duration::milliseconds(25),
        });

        assert_eq!(log.duration(), Some(Duration::from_millis(25)));
    }

    #[test]
    fn single_record_has_zero_duration() {
        let mut log = TransitionLog::new();
        log.record(record(None, "a"));
        assert_eq!(log.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = TransitionLog::new();
        log.record(record(None, "a"));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn records_serialize_round_trip() {
        let mut log = TransitionLog::new();
        log.record(record(None, "idle"));
        log.record(record(Some("idle"), "running"));

        let json = serde_json::to_string(&log).unwrap();
        let restored: TransitionLog = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.records(), log.records());
    }
}
