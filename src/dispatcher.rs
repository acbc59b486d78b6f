//! The scheduling loop.
//!
//! The dispatcher owns the clock, the pending queue, and the worker pool.
//! Each cycle it picks the next idle worker in round-robin order and hands it
//! the oldest queued item. All state transitions go through here.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::event::{Event, EventKind, EventLog};
use crate::generator::{Arrivals, NoArrivals, RandomArrivals, RandomRequests, RequestGenerator};
use crate::model::{Cycle, RunId, WorkItem, WorkerId};
use crate::queue::PendingQueue;
use crate::report::{Report, Summary, collect_and_classify};
use crate::telemetry::run::{record_cycle, start_run_span};
use crate::worker::{DispatchOutcome, OccupancyPolicy, Worker};

/// What the dispatcher decided in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An item was handed to `worker`.
    Dispatched {
        cycle: Cycle,
        worker: WorkerId,
        outcome: DispatchOutcome,
    },
    /// Work was queued but no worker was idle.
    ServerStarved { cycle: Cycle, queued: usize },
    /// The queue was empty; `arrived` says whether a new item was enqueued.
    QueueStarved { cycle: Cycle, arrived: bool },
}

pub struct Dispatcher {
    run_id: RunId,
    started_at: DateTime<Utc>,
    queue: PendingQueue,
    workers: Vec<Worker>,
    /// Workers removed mid-run. Kept so their logs still reach the report.
    retired: Vec<Worker>,
    /// Round-robin cursor: index of the first worker to try next cycle.
    next_worker: usize,
    current_cycle: Cycle,
    runtime: Cycle,
    policy: OccupancyPolicy,
    arrivals: Box<dyn Arrivals>,
    /// Starvation and arrival notices.
    log: EventLog,
    starting_queue_len: Option<usize>,
}

impl Dispatcher {
    /// Create a dispatcher with `workers` idle workers and an empty queue.
    ///
    /// Defaults to immediate-idle occupancy and no arrivals.
    pub fn new(workers: usize, runtime: Cycle) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Config("worker count must be positive".into()));
        }
        if runtime == 0 {
            return Err(Error::Config("runtime must be positive".into()));
        }
        let policy = OccupancyPolicy::default();
        Ok(Self {
            run_id: RunId::new(),
            started_at: Utc::now(),
            queue: PendingQueue::new(),
            workers: build_workers(workers, policy),
            retired: Vec::new(),
            next_worker: 0,
            current_cycle: 1,
            runtime,
            policy,
            arrivals: Box::new(NoArrivals),
            log: EventLog::new(),
            starting_queue_len: None,
        })
    }

    /// Build a dispatcher from validated configuration, with random arrivals
    /// and the initial backlog already queued.
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        config.validate()?;

        let durations = config.min_duration..=config.max_duration;
        let mut generator = RandomRequests::new(config.seed, durations);

        let mut dispatcher =
            Self::new(config.workers, config.runtime)?.with_policy(config.policy);
        dispatcher.seed_backlog(&mut generator, config.initial_backlog());

        Ok(dispatcher.with_arrivals(RandomArrivals::new(
            generator,
            config.arrival_probability,
            config.seed,
        )))
    }

    /// Set the occupancy policy for current and future workers.
    pub fn with_policy(mut self, policy: OccupancyPolicy) -> Self {
        self.policy = policy;
        for worker in &mut self.workers {
            worker.set_policy(policy);
        }
        self
    }

    pub fn with_arrivals(mut self, arrivals: impl Arrivals + 'static) -> Self {
        self.arrivals = Box::new(arrivals);
        self
    }

    // -----------------------------------------------------------------------
    // Queue and pool management
    // -----------------------------------------------------------------------

    pub fn enqueue(&mut self, item: WorkItem) {
        self.queue.enqueue(item);
    }

    /// Enqueue `count` items from `generator`.
    pub fn seed_backlog(&mut self, generator: &mut dyn RequestGenerator, count: usize) {
        for _ in 0..count {
            self.queue.enqueue(generator.next_item());
        }
        debug!(count, queued = self.queue.len(), "backlog seeded");
    }

    /// Add an idle worker at the end of the rotation.
    pub fn add_worker(&mut self) -> WorkerId {
        let id = self
            .workers
            .iter()
            .chain(&self.retired)
            .map(Worker::id)
            .max()
            .unwrap_or(0)
            + 1;
        self.workers.push(Worker::new(id, self.policy));
        info!(worker = id, pool = self.workers.len(), "worker added");
        id
    }

    /// Remove the last worker in the rotation. The pool never shrinks below
    /// one worker; returns `None` in that case.
    pub fn remove_worker(&mut self) -> Option<WorkerId> {
        if self.workers.len() <= 1 {
            return None;
        }
        let worker = self.workers.pop()?;
        if self.next_worker >= self.workers.len() {
            self.next_worker = 0;
        }
        let id = worker.id();
        self.retired.push(worker);
        info!(worker = id, pool = self.workers.len(), "worker removed");
        Some(id)
    }

    // -----------------------------------------------------------------------
    // Scheduling loop
    // -----------------------------------------------------------------------

    /// Run every remaining cycle up to and including the horizon.
    pub fn run(&mut self) {
        let span = start_run_span(&self.run_id, self.workers.len(), self.runtime);
        let _enter = span.enter();

        info!(
            queued = self.queue.len(),
            policy = %self.policy,
            "simulation started"
        );

        while let Some(outcome) = self.step() {
            record_cycle(&outcome);
        }

        info!(remaining = self.queue.len(), "simulation finished");
    }

    /// Advance one cycle. Returns `None` once the horizon has passed.
    pub fn step(&mut self) -> Option<CycleOutcome> {
        if self.is_finished() {
            return None;
        }
        let cycle = self.current_cycle;
        self.starting_queue_len.get_or_insert(self.queue.len());

        for worker in &mut self.workers {
            worker.release(cycle);
        }

        let outcome = match self.select_worker() {
            Some(index) => match self.queue.dequeue_front() {
                Some(item) => {
                    let worker = &mut self.workers[index];
                    let outcome = worker.dispatch(&item, cycle, self.runtime);
                    CycleOutcome::Dispatched {
                        cycle,
                        worker: worker.id(),
                        outcome,
                    }
                }
                None => self.starve_queue(cycle),
            },
            None if self.queue.is_empty() => self.starve_queue(cycle),
            None => {
                let queued = self.queue.len();
                self.log.record(
                    cycle,
                    EventKind::ServerStarved,
                    format!("No available workers. Requests in queue: {queued}"),
                );
                CycleOutcome::ServerStarved { cycle, queued }
            }
        };

        self.current_cycle += 1;
        Some(outcome)
    }

    /// Scan from the cursor for the first idle worker, wrapping around.
    /// Moves the cursor past the chosen worker.
    fn select_worker(&mut self) -> Option<usize> {
        let len = self.workers.len();
        let index = (0..len)
            .map(|offset| (self.next_worker + offset) % len)
            .find(|&index| self.workers[index].is_idle())?;
        self.next_worker = (index + 1) % len;
        Some(index)
    }

    fn starve_queue(&mut self, cycle: Cycle) -> CycleOutcome {
        self.log.record(
            cycle,
            EventKind::QueueStarved,
            "No requests in queue. Workers are idle.",
        );

        let arrived = match self.arrivals.next_arrival(cycle) {
            Some(item) => {
                self.log.record(
                    cycle,
                    EventKind::Arrived,
                    format!(
                        "New request from {} to {} added to the queue | Job Type: {} | Task Time: {} cycles",
                        item.source,
                        item.destination,
                        item.kind.tag(),
                        item.duration
                    ),
                );
                self.queue.enqueue(item);
                true
            }
            None => false,
        };

        CycleOutcome::QueueStarved { cycle, arrived }
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// The next cycle to be simulated.
    pub fn current_cycle(&self) -> Cycle {
        self.current_cycle
    }

    pub fn is_finished(&self) -> bool {
        self.current_cycle > self.runtime
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Dispatcher-owned notices (starvation, arrivals).
    pub fn events(&self) -> &[Event] {
        self.log.entries()
    }

    /// Merge every log, classify it, and summarize the run.
    ///
    /// Items still queued are abandoned and count as rejected.
    pub fn report(&self) -> Report {
        let logs = self
            .workers
            .iter()
            .chain(&self.retired)
            .map(Worker::events)
            .chain(std::iter::once(self.log.entries()));
        let classified = collect_and_classify(logs, self.runtime);

        let ending_queue_len = self.queue.len();
        let active_workers = self.workers.iter().filter(|w| !w.is_idle()).count();

        let summary = Summary {
            run_id: self.run_id,
            started_at: self.started_at,
            policy: self.policy,
            workers: self.workers.len(),
            starting_queue_len: self.starting_queue_len.unwrap_or(ending_queue_len),
            runtime: self.runtime,
            duration_range: self.queue.observed_range(),
            ending_queue_len,
            active_workers,
            inactive_workers: self.workers.len() - active_workers,
            finished: classified.finished,
            rejected: classified.rejected + ending_queue_len,
            overrun: classified.overrun,
            abandoned: ending_queue_len,
        };

        Report {
            summary,
            events: classified.events,
        }
    }
}

fn build_workers(count: usize, policy: OccupancyPolicy) -> Vec<Worker> {
    (1..=count as WorkerId)
        .map(|id| Worker::new(id, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ScriptedArrivals;
    use crate::model::JobKind;

    fn item(duration: Cycle) -> WorkItem {
        WorkItem::new("10.0.0.1", "10.0.0.2", duration, JobKind::Processing)
    }

    #[test]
    fn rejects_zero_workers_or_runtime() {
        assert!(matches!(Dispatcher::new(0, 10), Err(Error::Config(_))));
        assert!(matches!(Dispatcher::new(2, 0), Err(Error::Config(_))));
    }

    #[test]
    fn cursor_advances_even_on_empty_queue() {
        let mut dispatcher = Dispatcher::new(3, 10).unwrap();
        dispatcher.step();
        dispatcher.step();
        dispatcher.enqueue(item(1));

        // Cycles 1 and 2 selected workers 1 and 2, so worker 3 is next.
        let outcome = dispatcher.step().unwrap();
        assert!(matches!(
            outcome,
            CycleOutcome::Dispatched { worker: 3, cycle: 3, .. }
        ));
    }

    #[test]
    fn step_returns_none_after_horizon() {
        let mut dispatcher = Dispatcher::new(1, 2).unwrap();
        assert!(dispatcher.step().is_some());
        assert!(dispatcher.step().is_some());
        assert!(dispatcher.step().is_none());
        assert!(dispatcher.is_finished());
    }

    #[test]
    fn remove_worker_wraps_cursor_and_keeps_one() {
        let mut dispatcher = Dispatcher::new(2, 10).unwrap();
        dispatcher.step();
        assert_eq!(dispatcher.remove_worker(), Some(2));
        assert_eq!(dispatcher.remove_worker(), None);

        dispatcher.enqueue(item(1));
        let outcome = dispatcher.step().unwrap();
        assert!(matches!(outcome, CycleOutcome::Dispatched { worker: 1, .. }));
    }

    #[test]
    fn with_policy_keeps_existing_workers_and_logs() {
        let mut dispatcher = Dispatcher::new(1, 10).unwrap();
        dispatcher.enqueue(item(3));
        dispatcher.step();
        assert_eq!(dispatcher.add_worker(), 2);

        let mut dispatcher = dispatcher.with_policy(OccupancyPolicy::BusyUntilFinish);
        let ids: Vec<_> = dispatcher.workers().iter().map(Worker::id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(dispatcher.workers()[0].events().len(), 2);

        dispatcher.enqueue(item(4));
        let outcome = dispatcher.step().unwrap();
        assert!(matches!(outcome, CycleOutcome::Dispatched { worker: 1, cycle: 2, .. }));
        assert_eq!(dispatcher.workers()[0].busy_until(), Some(6));
    }

    #[test]
    fn arrival_notice_names_job_type_tag() {
        let arrival = WorkItem::new("10.0.0.3", "10.0.0.4", 5, JobKind::Streaming);
        let mut dispatcher = Dispatcher::new(1, 3)
            .unwrap()
            .with_arrivals(ScriptedArrivals::new().at(1, arrival));
        dispatcher.step();

        let arrived = dispatcher
            .events()
            .iter()
            .find(|e| e.kind == EventKind::Arrived)
            .unwrap();
        assert!(arrived.message.contains("Job Type: S"));
        assert!(arrived.message.contains("Task Time: 5 cycles"));
    }

    #[test]
    fn add_worker_never_reuses_retired_ids() {
        let mut dispatcher = Dispatcher::new(3, 10).unwrap();
        dispatcher.remove_worker();
        assert_eq!(dispatcher.add_worker(), 4);
        assert_eq!(dispatcher.workers().len(), 3);
    }
}
