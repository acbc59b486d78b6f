//! Simulation run span helpers.

use tracing::Span;

use crate::dispatcher::CycleOutcome;
use crate::model::{Cycle, RunId};
use crate::worker::DispatchOutcome;

/// Start a span covering one simulation run.
pub fn start_run_span(run_id: &RunId, workers: usize, runtime: Cycle) -> Span {
    tracing::info_span!(
        "simulation.run",
        "run.id" = %run_id,
        "run.workers" = workers,
        "run.runtime" = runtime,
    )
}

/// Emit a trace event describing one cycle's scheduling decision.
pub fn record_cycle(outcome: &CycleOutcome) {
    match *outcome {
        CycleOutcome::Dispatched {
            cycle,
            worker,
            outcome: DispatchOutcome::Completed { finish_cycle },
        } => {
            tracing::trace!(cycle, worker, finish_cycle, "dispatched");
        }
        CycleOutcome::Dispatched {
            cycle,
            worker,
            outcome: DispatchOutcome::Rejected,
        } => {
            tracing::trace!(cycle, worker, "rejected at admission");
        }
        CycleOutcome::ServerStarved { cycle, queued } => {
            tracing::trace!(cycle, queued, "no idle worker");
        }
        CycleOutcome::QueueStarved { cycle, arrived } => {
            tracing::trace!(cycle, arrived, "queue empty");
        }
    }
}
