//! Replay a recorded classifier stream offline.

use std::path::PathBuf;

use stepsort_common::config::AppConfig;
use stepsort_decision::DecisionPipeline;
use stepsort_link::{stdout_sink, Controller, DeliveryPolicy, ScriptedSource};

pub fn run(
    mut config: AppConfig,
    events: PathBuf,
    threshold: Option<f64>,
    capacity: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    super::apply_overrides(&mut config, threshold, capacity);
    let pipeline = DecisionPipeline::from_config(&config)?;

    let content = std::fs::read_to_string(&events)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", events.display()))?;
    let source = ScriptedSource::from_jsonl(&content, pipeline.table());
    tracing::info!(path = %events.display(), records = source.remaining(), "Replaying recording");

    let mut controller = Controller::new(
        pipeline,
        Box::new(source),
        Box::new(stdout_sink()),
        DeliveryPolicy::no_retry(),
    );
    let summary = controller.run()?;

    if json {
        super::write_summary_json(&mut std::io::stdout().lock(), &summary)?;
    } else {
        super::print_summary(&summary);
    }
    Ok(())
}
