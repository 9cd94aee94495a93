//! Validate the configuration.

use stepsort_common::config::AppConfig;
use stepsort_model::PositionTable;

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("Stepsort Configuration Check");
    println!("{}", "=".repeat(50));

    match config.validate() {
        Ok(()) => println!("[OK] Configuration is valid"),
        Err(e) => {
            println!("[FAIL] {e}");
            anyhow::bail!("configuration is invalid");
        }
    }

    let table = PositionTable::from_entries(&config.classes)?;
    println!(
        "[OK] Pipeline: threshold {} over the last {} accepted labels",
        config.pipeline.confidence_threshold, config.pipeline.buffer_capacity
    );
    println!("[OK] Classes: {} (classifier output order)", table.len());
    for label in table.labels() {
        println!("     {:<16} -> position {}", label, table.map(label)?);
    }

    println!(
        "[OK] Source poll timeout: {} ms",
        config.source.poll_timeout_ms
    );

    let device = &config.sink.device;
    if device.exists() {
        println!(
            "[OK] Device: {} at {} baud",
            device.display(),
            config.sink.baud_rate
        );
    } else {
        println!(
            "[WARN] Device: {} not found (use --dry-run or --device)",
            device.display()
        );
    }
    println!(
        "     settle {} ms, {} retries, backoff {} ms",
        config.sink.settle_ms, config.sink.retries, config.sink.retry_backoff_ms
    );

    Ok(())
}
