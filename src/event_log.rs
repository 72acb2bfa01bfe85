//! Append-only, deduplicated room event log
//!
//! The action history fetch and the live channel can both deliver the
//! same underlying action (the channel may beat the fetch or the other
//! way round) and live frames never carry a trusted upstream timestamp.
//! With no stable event id on the wire, the matching key is message
//! content plus a timestamp tolerance window.

use crate::data::RoomEvent;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Log statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventLogStats {
    pub accepted: u64,
    pub duplicates_dropped: u64,
}

/// Newest-first sequence of accepted room events
///
/// Grows monotonically during a room session; cleared only by full room
/// teardown.
#[derive(Debug)]
pub struct EventLog {
    entries: Vec<RoomEvent>,
    dedup_window: ChronoDuration,
    accepted: u64,
    duplicates_dropped: u64,
}

impl EventLog {
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            entries: Vec::new(),
            dedup_window: ChronoDuration::from_std(dedup_window)
                .unwrap_or_else(|_| ChronoDuration::milliseconds(1000)),
            accepted: 0,
            duplicates_dropped: 0,
        }
    }

    /// Whether the log already holds an entry with this exact message and
    /// a timestamp within the dedup window
    pub fn contains_similar(&self, message: &str, timestamp: DateTime<Utc>) -> bool {
        self.entries.iter().any(|event| {
            event.message == message
                && (event.timestamp - timestamp).abs() < self.dedup_window
        })
    }

    /// Record an event unless it duplicates a held entry
    ///
    /// Returns `false` (and leaves the log untouched) for duplicates.
    /// Accepted events are prepended: the log reads newest-first.
    pub fn record(&mut self, event: RoomEvent) -> bool {
        if self.contains_similar(&event.message, event.timestamp) {
            self.duplicates_dropped += 1;
            tracing::debug!("Dropped duplicate event: {}", event.message);
            return false;
        }

        self.accepted += 1;
        self.entries.insert(0, event);
        true
    }

    /// Iterate newest-first
    pub fn iter(&self) -> impl Iterator<Item = &RoomEvent> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[RoomEvent] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&RoomEvent> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full room teardown only
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> EventLogStats {
        EventLogStats {
            accepted: self.accepted,
            duplicates_dropped: self.duplicates_dropped,
        }
    }
}
