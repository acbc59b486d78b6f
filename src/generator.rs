//! Sources of work: request generators and arrival strategies.
//!
//! A [`RequestGenerator`] makes items on demand (initial backlog). An
//! [`Arrivals`] strategy decides, once per empty-queue cycle, whether a new
//! item shows up. Both are traits so tests can script them.

use std::collections::{BTreeMap, VecDeque};
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{Cycle, JobKind, WorkItem};

/// Produces work items on demand.
pub trait RequestGenerator {
    fn next_item(&mut self) -> WorkItem;
}

/// Decides whether a new item arrives during an empty-queue cycle.
pub trait Arrivals {
    fn next_arrival(&mut self, cycle: Cycle) -> Option<WorkItem>;
}

// ---------------------------------------------------------------------------
// Random requests
// ---------------------------------------------------------------------------

/// Random dotted-quad endpoints, uniform durations, 50/50 job kinds.
pub struct RandomRequests {
    rng: StdRng,
    durations: RangeInclusive<Cycle>,
}

impl RandomRequests {
    /// Seeded generator; `None` seeds from the OS.
    pub fn new(seed: Option<u64>, durations: RangeInclusive<Cycle>) -> Self {
        debug_assert!(*durations.start() > 0, "durations must be positive");
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, durations }
    }

    fn address(&mut self) -> String {
        let octets: [u8; 4] = std::array::from_fn(|_| self.rng.gen_range(0..=255));
        format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
    }
}

impl RequestGenerator for RandomRequests {
    fn next_item(&mut self) -> WorkItem {
        let source = self.address();
        let destination = self.address();
        let duration = self.rng.gen_range(self.durations.clone());
        let kind = if self.rng.gen_bool(0.5) {
            JobKind::Processing
        } else {
            JobKind::Streaming
        };
        WorkItem::new(source, destination, duration, kind)
    }
}

// ---------------------------------------------------------------------------
// Arrival strategies
// ---------------------------------------------------------------------------

/// Never produces an arrival.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArrivals;

impl Arrivals for NoArrivals {
    fn next_arrival(&mut self, _cycle: Cycle) -> Option<WorkItem> {
        None
    }
}

/// Produces a generated item with fixed probability per empty cycle.
pub struct RandomArrivals<G> {
    generator: G,
    probability: f64,
    rng: StdRng,
}

impl<G: RequestGenerator> RandomArrivals<G> {
    /// `probability` must lie in `[0, 1]`.
    pub fn new(generator: G, probability: f64, seed: Option<u64>) -> Self {
        debug_assert!((0.0..=1.0).contains(&probability));
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            generator,
            probability,
            rng,
        }
    }
}

impl<G: RequestGenerator> Arrivals for RandomArrivals<G> {
    fn next_arrival(&mut self, _cycle: Cycle) -> Option<WorkItem> {
        if self.rng.gen_bool(self.probability) {
            Some(self.generator.next_item())
        } else {
            None
        }
    }
}

/// Replays items at fixed cycles. Several items may share a cycle; they are
/// returned one per call in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedArrivals {
    script: BTreeMap<Cycle, VecDeque<WorkItem>>,
}

impl ScriptedArrivals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, cycle: Cycle, item: WorkItem) -> Self {
        self.script.entry(cycle).or_default().push_back(item);
        self
    }
}

impl Arrivals for ScriptedArrivals {
    fn next_arrival(&mut self, cycle: Cycle) -> Option<WorkItem> {
        self.script.get_mut(&cycle)?.pop_front()
    }
}
