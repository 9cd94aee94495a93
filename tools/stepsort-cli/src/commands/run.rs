//! Run the control loop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stepsort_common::config::AppConfig;
use stepsort_common::error::StepsortResult;
use stepsort_decision::DecisionPipeline;
use stepsort_link::{
    open_device, stdout_sink, ActuatorSink, ClassifierSource, Controller, DeliveryPolicy,
    LineSource, RunSummary,
};

pub async fn run(
    mut config: AppConfig,
    events: PathBuf,
    device: Option<PathBuf>,
    threshold: Option<f64>,
    capacity: Option<usize>,
    dry_run: bool,
) -> anyhow::Result<()> {
    super::apply_overrides(&mut config, threshold, capacity);
    if let Some(device) = device {
        config.sink.device = device;
    }
    let pipeline = DecisionPipeline::from_config(&config)?;

    eprintln!("Starting control loop");
    eprintln!(
        "  Events: {}",
        if events.as_os_str() == "-" {
            "stdin".to_string()
        } else {
            events.display().to_string()
        }
    );
    eprintln!(
        "  Actuator: {}",
        if dry_run {
            "stdout (dry run)".to_string()
        } else {
            config.sink.device.display().to_string()
        }
    );
    eprintln!(
        "  Threshold: {}  Buffer: {}",
        config.pipeline.confidence_threshold, config.pipeline.buffer_capacity
    );
    eprintln!();
    eprintln!("Press Ctrl+C to stop...");

    let stop_flag = Arc::new(AtomicBool::new(false));
    let loop_flag = stop_flag.clone();

    // Opening the device and the cycle loop both block, so they live off
    // the async runtime. Source and sink are dropped with the controller.
    let mut handle = tokio::task::spawn_blocking(move || -> StepsortResult<RunSummary> {
        let timeout = Duration::from_millis(config.source.poll_timeout_ms);
        let table = pipeline.table().clone();
        let source: Box<dyn ClassifierSource> = if events.as_os_str() == "-" {
            Box::new(LineSource::stdin(table, timeout)?)
        } else {
            Box::new(LineSource::open(&events, table, timeout)?)
        };
        let sink: Box<dyn ActuatorSink> = if dry_run {
            Box::new(stdout_sink())
        } else {
            Box::new(open_device(
                &config.sink.device,
                config.sink.baud_rate,
                Duration::from_millis(config.sink.settle_ms),
            )?)
        };

        let mut controller = Controller::new(
            pipeline,
            source,
            sink,
            DeliveryPolicy::from_sink_config(&config.sink),
        )
        .with_stop_flag(loop_flag);
        controller.run()
    });

    let summary = tokio::select! {
        joined = &mut handle => joined??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Stop requested; finishing current cycle");
            stop_flag.store(true, Ordering::SeqCst);
            handle.await??
        }
    };

    super::print_summary(&summary);
    Ok(())
}
