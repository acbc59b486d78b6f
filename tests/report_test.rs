//! Integration tests for log merging, classification, and report sinks.

use lbsim::dispatcher::Dispatcher;
use lbsim::event::{Event, EventKind};
use lbsim::model::{Cycle, JobKind, WorkItem};
use lbsim::report::collect_and_classify;

fn event(cycle: Cycle, kind: EventKind, message: &str) -> Event {
    Event {
        cycle,
        kind,
        message: message.to_string(),
    }
}

fn finished_run() -> Dispatcher {
    let mut dispatcher = Dispatcher::new(2, 10).unwrap();
    dispatcher.enqueue(WorkItem::new("1.1.1.1", "2.2.2.2", 3, JobKind::Processing));
    dispatcher.enqueue(WorkItem::new("3.3.3.3", "4.4.4.4", 4, JobKind::Streaming));
    dispatcher.run();
    dispatcher
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn finish_after_horizon_counts_as_rejected() {
    let log = vec![
        event(8, EventKind::Started, "Worker 1 is processing request from a to b"),
        event(15, EventKind::Finished, "Worker 1 finished processing request from a to b"),
    ];

    let classified = collect_and_classify([log.as_slice()], 13);
    assert_eq!(classified.finished, 0);
    assert_eq!(classified.rejected, 1);
    assert_eq!(classified.overrun, 1);
    // Still shown, in order.
    assert_eq!(classified.events.len(), 2);
    assert_eq!(classified.events[1].cycle, 15);
}

#[test]
fn finish_on_horizon_counts_as_finished() {
    let log = vec![event(13, EventKind::Finished, "done")];
    let classified = collect_and_classify([log.as_slice()], 13);
    assert_eq!(classified.finished, 1);
    assert_eq!(classified.rejected, 0);
}

#[test]
fn rejections_within_horizon_are_counted_once() {
    let a = vec![event(3, EventKind::Rejected, "cannot be processed within the time duration")];
    let b = vec![event(5, EventKind::Rejected, "cannot be processed within the time duration")];
    let classified = collect_and_classify([a.as_slice(), b.as_slice()], 10);
    assert_eq!(classified.rejected, 2);
    assert_eq!(classified.overrun, 0);
}

// ---------------------------------------------------------------------------
// Rendering and sinks
// ---------------------------------------------------------------------------

#[test]
fn text_report_has_one_line_and_separator_per_event() {
    let report = finished_run().report();
    let text = report.render_text();

    let cycle_lines: Vec<_> = text
        .lines()
        .filter(|l| l.starts_with("Clock cycle "))
        .collect();
    assert_eq!(cycle_lines.len(), report.events.len());
    assert!(
        cycle_lines[0].starts_with("Clock cycle 1: Worker 1 is processing request from 1.1.1.1")
    );

    let lines: Vec<_> = text.lines().collect();
    let first = lines.iter().position(|l| l.starts_with("Clock cycle ")).unwrap();
    assert!(lines[first + 1].chars().all(|c| c == '-'));

    assert!(text.contains("Starting queue size: 2"));
    assert!(text.contains("Cycle horizon: 10"));
    assert!(text.contains("Request duration range: [3, 4]"));
    assert!(text.contains("Ending queue size: 0"));
    assert!(text.contains("Requests finished: 2"));
    assert!(text.contains("Requests rejected: 0"));
}

#[test]
fn append_to_file_accumulates_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lbsim.log");

    let report = finished_run().report();
    report.append_to_file(&path).unwrap();
    report.append_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("Requests finished: 2").count(), 2);
}

#[test]
fn json_report_round_trips_summary_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    let report = finished_run().report();
    report.write_json(&path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["summary"]["finished"], 2);
    assert_eq!(value["summary"]["policy"], "immediate-idle");
    assert_eq!(value["summary"]["duration_range"]["min"], 3);
    assert_eq!(value["events"][0]["kind"], "started");
}
