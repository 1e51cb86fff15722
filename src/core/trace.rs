//! Applied-event trace for diagnostics.
//!
//! The machine appends one entry per applied event, recording key names and
//! timestamps only. Payloads may hold opaque host resources and are never
//! captured. The trace is an immutable value: `record` returns a new trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single applied event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Name of the key that was current before the event was applied.
    pub from: String,
    /// Name of the applied event's key.
    pub to: String,
    /// When the event was applied.
    pub timestamp: DateTime<Utc>,
}

impl TraceEntry {
    /// Build an entry stamped with the current time.
    pub fn now(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered trace of every event a machine has applied.
///
/// # Example
///
/// ```rust
/// use cascade::core::{TraceEntry, TransitionTrace};
///
/// let trace = TransitionTrace::new()
///     .record(TraceEntry::now("loading", "loaded"))
///     .record(TraceEntry::now("loaded", "started"));
///
/// assert_eq!(trace.path(), vec!["loading", "loaded", "started"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionTrace {
    entries: Vec<TraceEntry>,
}

impl TransitionTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record an entry, returning a new trace. The original is unchanged.
    pub fn record(&self, entry: TraceEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self { entries }
    }

    /// The sequence of key names traversed: the first entry's origin, then
    /// the destination of every entry. Empty for an empty trace.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.entries.first() {
            path.push(first.from.as_str());
        }
        for entry in &self.entries {
            path.push(entry.to.as_str());
        }
        path
    }

    /// Elapsed time between the first and last entry, `None` when empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// All recorded entries in order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }
}
