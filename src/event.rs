//! Cycle-stamped events recorded during a run.
//!
//! Workers record what happened to the items they were handed; the
//! dispatcher records starvation and arrivals. Classification is by
//! [`EventKind`], never by message text.

use serde::{Deserialize, Serialize};

use crate::model::Cycle;

/// A single log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Cycle the event is stamped with. For `Finished` this is a projection
    /// and may lie ahead of the cycle that recorded it.
    pub cycle: Cycle,
    pub kind: EventKind,
    /// Human-readable description.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A worker accepted an item.
    Started,
    /// Projected completion of an accepted item.
    Finished,
    /// Admission check failed against the horizon.
    Rejected,
    /// Nothing was queued this cycle.
    QueueStarved,
    /// Work was queued but every worker was busy.
    ServerStarved,
    /// A new item arrived while the queue was empty.
    Arrived,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::Started => "started",
            EventKind::Finished => "finished",
            EventKind::Rejected => "rejected",
            EventKind::QueueStarved => "queue_starved",
            EventKind::ServerStarved => "server_starved",
            EventKind::Arrived => "arrived",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Clock cycle {}: {}", self.cycle, self.message)
    }
}

/// Append-only event log owned by one recorder.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, cycle: Cycle, kind: EventKind, message: impl Into<String>) {
        self.entries.push(Event {
            cycle,
            kind,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[Event] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
