//! Core data model.
//!
//! A work item is one synthetic network request: where it came from, where it
//! is going, what kind of job it is, and how many cycles it needs. Items carry
//! no identity; two items with the same attributes are interchangeable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One discrete unit of simulated time. The first cycle is 1.
pub type Cycle = u64;

/// Stable, 1-based worker identity.
pub type WorkerId = u32;

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// A unit of work waiting to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Source endpoint (an address-like string).
    pub source: String,

    /// Destination endpoint.
    pub destination: String,

    /// Cycles required to service the item. Always positive.
    pub duration: Cycle,

    pub kind: JobKind,
}

impl WorkItem {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        duration: Cycle,
        kind: JobKind,
    ) -> Self {
        debug_assert!(duration > 0, "work item duration must be positive");
        Self {
            source: source.into(),
            destination: destination.into(),
            duration,
            kind,
        }
    }
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({}, {} cycles)",
            self.source, self.destination, self.kind, self.duration
        )
    }
}

// ---------------------------------------------------------------------------
// Job Kind
// ---------------------------------------------------------------------------

/// The two categories of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Processing,
    Streaming,
}

impl JobKind {
    /// Single-letter tag (`P` / `S`).
    pub fn tag(self) -> char {
        match self {
            JobKind::Processing => 'P',
            JobKind::Streaming => 'S',
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobKind::Processing => "Processing",
            JobKind::Streaming => "Streaming",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Duration Range
// ---------------------------------------------------------------------------

/// Observed `[min, max]` over enqueued durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: Cycle,
    pub max: Cycle,
}

impl DurationRange {
    /// Widen an optional range to include `duration`.
    ///
    /// `None` stands for the empty range, so the first observation sets both
    /// bounds.
    pub fn observe(range: Option<Self>, duration: Cycle) -> Self {
        match range {
            None => Self {
                min: duration,
                max: duration,
            },
            Some(mut r) => {
                if duration > r.max {
                    r.max = duration;
                }
                if duration < r.min {
                    r.min = duration;
                }
                r
            }
        }
    }
}

impl std::fmt::Display for DurationRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Run Id
// ---------------------------------------------------------------------------

/// Newtype for simulation run IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_sets_both_bounds() {
        let r = DurationRange::observe(None, 7);
        assert_eq!(r, DurationRange { min: 7, max: 7 });
    }

    #[test]
    fn observe_widens_in_both_directions() {
        let r = [7, 3, 19, 11]
            .into_iter()
            .fold(None, |r, d| Some(DurationRange::observe(r, d)))
            .unwrap();
        assert_eq!(r, DurationRange { min: 3, max: 19 });
    }

    #[test]
    fn job_kind_tags() {
        assert_eq!(JobKind::Processing.tag(), 'P');
        assert_eq!(JobKind::Streaming.tag(), 'S');
    }

    #[test]
    fn run_id_displays_short_prefix() {
        let id = RunId::new();
        assert_eq!(id.to_string().len(), 8);
    }
}
