//! Single-capacity worker with its own event log.
//!
//! Service time is arithmetic on the simulation clock. Dispatch resolves
//! synchronously: the start and the projected finish are both recorded
//! before `dispatch` returns.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{Event, EventKind, EventLog};
use crate::model::{Cycle, WorkItem, WorkerId};

/// How long a worker stays unavailable after accepting an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupancyPolicy {
    /// Idle again as soon as `dispatch` returns, whatever the duration.
    #[default]
    ImmediateIdle,
    /// Busy until the clock reaches the projected finish cycle.
    BusyUntilFinish,
}

impl std::fmt::Display for OccupancyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OccupancyPolicy::ImmediateIdle => "immediate-idle",
            OccupancyPolicy::BusyUntilFinish => "busy-until-finish",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OccupancyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate-idle" => Ok(OccupancyPolicy::ImmediateIdle),
            "busy-until-finish" => Ok(OccupancyPolicy::BusyUntilFinish),
            _ => Err(format!(
                "unknown occupancy policy '{s}' (expected immediate-idle or busy-until-finish)"
            )),
        }
    }
}

/// What happened when an item was handed to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Accepted; the finish event is stamped at `finish_cycle`.
    Completed { finish_cycle: Cycle },
    /// Would not finish by the deadline. The worker is unchanged.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Worker {
    id: WorkerId,
    idle: bool,
    policy: OccupancyPolicy,
    /// Projected finish of the item in service (busy-until-finish only).
    busy_until: Option<Cycle>,
    log: EventLog,
}

impl Worker {
    pub fn new(id: WorkerId, policy: OccupancyPolicy) -> Self {
        Self {
            id,
            idle: true,
            policy,
            busy_until: None,
            log: EventLog::new(),
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Projected finish of the current item, if the worker is held busy.
    pub fn busy_until(&self) -> Option<Cycle> {
        self.busy_until
    }

    /// Switch occupancy policy. Moving to immediate-idle frees a held worker.
    pub fn set_policy(&mut self, policy: OccupancyPolicy) {
        self.policy = policy;
        if policy == OccupancyPolicy::ImmediateIdle {
            self.busy_until = None;
            self.idle = true;
        }
    }

    /// Free the worker if its projected finish has been reached.
    pub fn release(&mut self, cycle: Cycle) {
        if self.busy_until.is_some_and(|finish| cycle >= finish) {
            self.busy_until = None;
            self.idle = true;
            debug!(worker = self.id, cycle, "worker released");
        }
    }

    /// Admission-check `item` against `deadline` and, if it fits, service it.
    ///
    /// An item that finishes exactly on the deadline is accepted.
    pub fn dispatch(
        &mut self,
        item: &WorkItem,
        current: Cycle,
        deadline: Cycle,
    ) -> DispatchOutcome {
        let finish_cycle = match current.checked_add(item.duration) {
            Some(finish) if finish <= deadline => finish,
            _ => {
                self.log.record(
                    current,
                    EventKind::Rejected,
                    format!(
                        "Request from {} to {} cannot be processed within the time duration.",
                        item.source, item.destination
                    ),
                );
                debug!(
                    worker = self.id,
                    cycle = current,
                    duration = item.duration,
                    deadline,
                    "admission rejected"
                );
                return DispatchOutcome::Rejected;
            }
        };
        self.idle = false;
        self.log.record(
            current,
            EventKind::Started,
            format!(
                "Worker {} is processing request from {} to {} | Job Type: {} | Task Time: {} cycles",
                self.id, item.source, item.destination, item.kind, item.duration
            ),
        );
        self.log.record(
            finish_cycle,
            EventKind::Finished,
            format!(
                "Worker {} finished processing request from {} to {}",
                self.id, item.source, item.destination
            ),
        );
        debug!(worker = self.id, cycle = current, finish_cycle, "item accepted");

        match self.policy {
            OccupancyPolicy::ImmediateIdle => self.idle = true,
            OccupancyPolicy::BusyUntilFinish => self.busy_until = Some(finish_cycle),
        }

        DispatchOutcome::Completed { finish_cycle }
    }

    pub fn events(&self) -> &[Event] {
        self.log.entries()
    }
}
