//! Merging, classification, and rendering of run output.
//!
//! Counters are never tracked during the run; they are derived here from the
//! merged log so nothing is counted twice.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::event::{Event, EventKind};
use crate::model::{Cycle, DurationRange, RunId};
use crate::worker::OccupancyPolicy;

const SEPARATOR_WIDTH: usize = 72;

/// Merged, time-ordered events with derived counters.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub events: Vec<Event>,
    pub finished: usize,
    /// Admission rejections plus horizon overruns.
    pub rejected: usize,
    /// Events stamped after the horizon. Included in `rejected`.
    pub overrun: usize,
}

/// Merge `logs` in the order given, stable-sort by cycle, and count outcomes.
///
/// Within the horizon, `Finished` and `Rejected` events count as such. Any
/// event stamped after `runtime` counts as rejected regardless of kind.
pub fn collect_and_classify<'a, I>(logs: I, runtime: Cycle) -> Classified
where
    I: IntoIterator<Item = &'a [Event]>,
{
    let mut events: Vec<Event> = logs.into_iter().flatten().cloned().collect();
    // `sort_by_key` is stable: same-cycle events keep their merge order.
    events.sort_by_key(|e| e.cycle);

    let mut classified = Classified::default();
    for event in &events {
        if event.cycle > runtime {
            classified.rejected += 1;
            classified.overrun += 1;
            continue;
        }
        match event.kind {
            EventKind::Finished => classified.finished += 1,
            EventKind::Rejected => classified.rejected += 1,
            _ => {}
        }
    }
    classified.events = events;
    classified
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// End-of-run figures.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub policy: OccupancyPolicy,
    pub workers: usize,
    pub starting_queue_len: usize,
    pub runtime: Cycle,
    /// `None` if nothing was ever enqueued.
    pub duration_range: Option<DurationRange>,
    pub ending_queue_len: usize,
    pub active_workers: usize,
    pub inactive_workers: usize,
    pub finished: usize,
    /// Rejections, overruns, and abandoned queue items.
    pub rejected: usize,
    pub overrun: usize,
    pub abandoned: usize,
}

/// Everything a run produced, ready for a sink.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub events: Vec<Event>,
}

impl Report {
    /// Render the start block, every event, and the end block as text.
    pub fn render_text(&self) -> String {
        let s = &self.summary;
        let separator = "-".repeat(SEPARATOR_WIDTH);
        let range = s
            .duration_range
            .map(|r| r.to_string())
            .unwrap_or_else(|| "n/a".to_string());

        let mut out = String::new();
        out.push_str(&format!(
            "Run {} started {}\n",
            s.run_id,
            s.started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("Workers: {} ({})\n", s.workers, s.policy));
        out.push_str(&format!("Starting queue size: {}\n", s.starting_queue_len));
        out.push_str(&format!("Cycle horizon: {}\n", s.runtime));
        out.push_str(&format!("Request duration range: {range}\n"));
        out.push_str(&separator);
        out.push('\n');

        for event in &self.events {
            out.push_str(&event.to_string());
            out.push('\n');
            out.push_str(&separator);
            out.push('\n');
        }

        out.push_str(&format!("Ending queue size: {}\n", s.ending_queue_len));
        out.push_str(&format!("Active workers: {}\n", s.active_workers));
        out.push_str(&format!("Inactive workers: {}\n", s.inactive_workers));
        out.push_str(&format!("Requests finished: {}\n", s.finished));
        out.push_str(&format!(
            "Requests rejected: {} (overrun: {}, abandoned: {})\n",
            s.rejected, s.overrun, s.abandoned
        ));
        out
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        writer.write_all(self.render_text().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Append the rendered report to `path`, creating it if needed.
    pub fn append_to_file(&self, path: &Path) -> Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.write_to(file)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
