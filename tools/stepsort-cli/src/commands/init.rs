//! Write a default configuration file.

use std::path::PathBuf;

use stepsort_common::config::{config_file_path, AppConfig};

pub fn run(output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(config_file_path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let config = AppConfig::default();
    config
        .save_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;

    println!("Wrote default configuration to {}", path.display());
    println!("  Threshold: {}", config.pipeline.confidence_threshold);
    println!("  Buffer capacity: {}", config.pipeline.buffer_capacity);
    println!("  Device: {}", config.sink.device.display());
    println!("  Classes:");
    for entry in &config.classes {
        println!("    {} -> {}", entry.label, entry.position);
    }
    println!();
    println!("Edit the class list to match your classifier's output order.");

    Ok(())
}
