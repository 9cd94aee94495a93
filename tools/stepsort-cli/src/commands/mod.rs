//! Subcommand implementations.

use std::io::Write;
use std::path::Path;

use stepsort_common::config::AppConfig;
use stepsort_link::RunSummary;

pub mod check;
pub mod init;
pub mod replay;
pub mod run;

/// Load configuration from an explicit path, or the standard location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        None => AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load config: {e}")),
    }
}

/// Apply command-line overrides for the pipeline parameters.
pub fn apply_overrides(config: &mut AppConfig, threshold: Option<f64>, capacity: Option<usize>) {
    if let Some(threshold) = threshold {
        config.pipeline.confidence_threshold = threshold;
    }
    if let Some(capacity) = capacity {
        config.pipeline.buffer_capacity = capacity;
    }
}

/// Write a run summary as pretty JSON, for piping into other tools.
pub fn write_summary_json(out: &mut impl Write, summary: &RunSummary) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    writeln!(out)?;
    Ok(())
}

/// Print a run summary to stderr; stdout may be carrying actuator commands.
pub fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!("Run summary (started {}):", summary.started_at.to_rfc3339());
    eprintln!("  Cycles: {}", summary.cycles);
    eprintln!(
        "  Events: {} received, {} accepted",
        summary.events_received, summary.events_accepted
    );
    eprintln!("  Capture failures: {}", summary.capture_failures);
    eprintln!(
        "  Dispatches: {} ({} failed)",
        summary.dispatches, summary.sink_failures
    );
    match summary.last_position {
        Some(position) => eprintln!("  Last position: {position}"),
        None => eprintln!("  Last position: none"),
    }
}
