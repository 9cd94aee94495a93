use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepsort_common::config::AppConfig;
use stepsort_common::error::{StepsortError, StepsortResult};
use stepsort_decision::DecisionPipeline;
use stepsort_link::{
    ActuatorSink, ClassifierSource, Controller, DeliveryPolicy, LineSource, ScriptedSource,
};
use stepsort_model::{ClassificationEvent, DispatchCommand, Position, PositionTable};

/// Sink that records delivered positions and can be told to fail.
#[derive(Clone, Default)]
struct Recorder {
    delivered: Arc<Mutex<Vec<Position>>>,
    failures_left: Arc<Mutex<u32>>,
}

impl Recorder {
    fn failing(times: u32) -> Self {
        let recorder = Self::default();
        *recorder.failures_left.lock().unwrap() = times;
        recorder
    }

    fn delivered(&self) -> Vec<Position> {
        self.delivered.lock().unwrap().clone()
    }
}

impl ActuatorSink for Recorder {
    fn send(&mut self, command: &DispatchCommand) -> StepsortResult<()> {
        let mut failures = self.failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(StepsortError::sink("port busy"));
        }
        self.delivered.lock().unwrap().push(command.position);
        Ok(())
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

fn config(threshold: f64, capacity: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.pipeline.confidence_threshold = threshold;
    config.pipeline.buffer_capacity = capacity;
    config
}

fn controller(
    config: &AppConfig,
    source: impl ClassifierSource + 'static,
    sink: Recorder,
    delivery: DeliveryPolicy,
) -> Controller {
    Controller::new(
        DecisionPipeline::from_config(config).unwrap(),
        Box::new(source),
        Box::new(sink),
        delivery,
    )
}

fn events(items: &[(&str, f64)]) -> Vec<ClassificationEvent> {
    items
        .iter()
        .map(|(label, confidence)| ClassificationEvent::new(*label, *confidence))
        .collect()
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("events")
        .join("sorting-run.jsonl")
}

#[test]
fn dispatches_only_on_change() {
    let source = ScriptedSource::from_events(events(&[
        ("nut", 0.9),
        ("nut", 0.9),
        ("screw", 0.9),
        ("nut", 0.9),
        ("screw", 0.9),
        ("screw", 0.9),
        ("screw", 0.2),
    ]));
    let sink = Recorder::default();
    let mut ctl = controller(&config(0.7, 3), source, sink.clone(), DeliveryPolicy::no_retry());

    let summary = ctl.run().unwrap();
    assert_eq!(sink.delivered(), vec![Position(1), Position(2)]);
    assert_eq!(summary.dispatches, 2);
    assert_eq!(summary.events_received, 7);
    assert_eq!(summary.events_accepted, 6);
    assert_eq!(summary.last_position, Some(Position(2)));
}

#[test]
fn transient_capture_failure_skips_cycle() {
    let source = ScriptedSource::new(vec![
        Ok(ClassificationEvent::new("nut", 0.9)),
        Err(StepsortError::capture("camera returned no frame")),
        Ok(ClassificationEvent::new("nut", 0.9)),
    ]);
    let sink = Recorder::default();
    let mut ctl = controller(&config(0.7, 2), source, sink.clone(), DeliveryPolicy::no_retry());

    let summary = ctl.run().unwrap();
    assert_eq!(summary.capture_failures, 1);
    assert_eq!(summary.cycles, 3);
    assert_eq!(sink.delivered(), vec![Position(1)]);
}

#[test]
fn failed_write_leaves_state_and_retries_next_cycle() {
    let source = ScriptedSource::from_events(events(&[("screw", 0.9), ("screw", 0.1)]));
    let sink = Recorder::failing(1);
    let mut ctl = controller(&config(0.7, 1), source, sink.clone(), DeliveryPolicy::no_retry());

    assert!(ctl.run_cycle().unwrap());
    assert_eq!(ctl.pipeline().state().last_dispatched, None);
    assert_eq!(ctl.summary().sink_failures, 1);

    assert!(ctl.run_cycle().unwrap());
    assert_eq!(ctl.pipeline().state().last_dispatched, Some(Position(2)));
    assert_eq!(sink.delivered(), vec![Position(2)]);
}

#[test]
fn backoff_retries_within_one_cycle() {
    let source = ScriptedSource::from_events(events(&[("bearing", 0.9)]));
    let sink = Recorder::failing(2);
    let delivery = DeliveryPolicy {
        retries: 2,
        backoff: Duration::from_millis(1),
    };
    let mut ctl = controller(&config(0.7, 1), source, sink.clone(), delivery);

    let summary = ctl.run().unwrap();
    assert_eq!(summary.sink_failures, 0);
    assert_eq!(sink.delivered(), vec![Position(0)]);
}

#[test]
fn unknown_label_aborts_run() {
    let source = ScriptedSource::from_events(events(&[("nut", 0.9), ("washer", 0.9)]));
    let sink = Recorder::default();
    let mut ctl = controller(&config(0.7, 3), source, sink, DeliveryPolicy::no_retry());

    let err = ctl.run().unwrap_err();
    assert!(matches!(err, StepsortError::UnknownLabel { .. }));
}

#[test]
fn stop_flag_ends_loop_before_next_cycle() {
    let source = ScriptedSource::from_events(events(&[("nut", 0.9); 5]));
    let sink = Recorder::default();
    let mut ctl = controller(&config(0.7, 1), source, sink.clone(), DeliveryPolicy::no_retry());

    ctl.stop();
    let summary = ctl.run().unwrap();
    assert_eq!(summary.cycles, 0);
    assert!(sink.delivered().is_empty());
}

#[test]
fn external_stop_flag_is_shared() {
    let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let source = ScriptedSource::from_events(events(&[("nut", 0.9); 3]));
    let mut ctl = controller(&config(0.7, 1), source, Recorder::default(), DeliveryPolicy::no_retry())
        .with_stop_flag(flag.clone());

    assert!(ctl.run_cycle().unwrap());
    flag.store(true, std::sync::atomic::Ordering::SeqCst);
    let summary = ctl.run().unwrap();
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.dispatches, 1);
}

#[test]
fn recorded_fixture_replays_to_two_commands() {
    let content = std::fs::read_to_string(fixture_path()).expect("fixture should be readable");
    let config = AppConfig::default();
    let table = PositionTable::from_entries(&config.classes).unwrap();

    let sink = Recorder::default();
    let source = ScriptedSource::from_jsonl(&content, &table);
    let mut ctl = controller(&config, source, sink.clone(), DeliveryPolicy::no_retry());

    let summary = ctl.run().unwrap();
    assert_eq!(sink.delivered(), vec![Position(3), Position(1)]);
    assert_eq!(summary.cycles, 23);
    assert_eq!(summary.events_received, 22);
    assert_eq!(summary.events_accepted, 19);
    assert_eq!(summary.capture_failures, 1);
}

#[test]
fn line_source_over_fixture_matches_replay() {
    let config = AppConfig::default();
    let table = PositionTable::from_entries(&config.classes).unwrap();
    let source = LineSource::open(&fixture_path(), table, Duration::from_secs(5)).unwrap();

    let sink = Recorder::default();
    let mut ctl = controller(&config, source, sink.clone(), DeliveryPolicy::no_retry());

    ctl.run().unwrap();
    assert_eq!(sink.delivered(), vec![Position(3), Position(1)]);
}

#[test]
fn garbled_line_mid_stream_skips_one_cycle() {
    let table = PositionTable::from_entries(&AppConfig::default().classes).unwrap();
    let mut input = Vec::new();
    input.extend_from_slice(b"{\"label\":\"nut\",\"confidence\":0.9}\n");
    input.extend_from_slice(b"\xff\xfe garbled\n");
    input.extend_from_slice(b"{\"label\":\"nut\",\"confidence\":0.9}\n");
    input.extend_from_slice(b"{\"label\":\"nut\",\"confidence\":0.9}\n");
    let source = LineSource::spawn(
        "bench",
        std::io::Cursor::new(input),
        table,
        Duration::from_secs(5),
    )
    .unwrap();

    let sink = Recorder::default();
    let mut ctl = controller(&config(0.7, 3), source, sink.clone(), DeliveryPolicy::no_retry());

    let summary = ctl.run().unwrap();
    assert_eq!(summary.capture_failures, 1);
    assert_eq!(summary.events_received, 3);
    assert_eq!(sink.delivered(), vec![Position(1)]);
}

#[test]
fn summary_serializes() {
    let source = ScriptedSource::from_events(Vec::new());
    let mut ctl = controller(&config(0.7, 3), source, Recorder::default(), DeliveryPolicy::no_retry());
    let summary = ctl.run().unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["cycles"], 0);
    assert!(json["last_position"].is_null());
    assert!(json["started_at"].is_string());
}
