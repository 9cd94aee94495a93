//! The control loop: one classification in, at most one command out, per cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stepsort_common::config::SinkConfig;
use stepsort_common::error::StepsortResult;
use stepsort_decision::DecisionPipeline;
use stepsort_model::{DispatchCommand, Position};

use crate::{ActuatorSink, ClassifierSource};

/// Delivery policy for actuator writes.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Extra attempts after the first failed write.
    pub retries: u32,

    /// Wait before the first retry; doubled for each further retry.
    pub backoff: Duration,
}

impl DeliveryPolicy {
    pub fn from_sink_config(config: &SinkConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub cycles: u64,
    pub events_received: u64,
    pub events_accepted: u64,
    pub capture_failures: u64,
    pub dispatches: u64,
    pub sink_failures: u64,
    pub last_position: Option<Position>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            cycles: 0,
            events_received: 0,
            events_accepted: 0,
            capture_failures: 0,
            dispatches: 0,
            sink_failures: 0,
            last_position: None,
        }
    }
}

/// Owns the pipeline, the source, and the sink for one session.
///
/// Source and sink are released when the controller is dropped, whichever
/// way [`run`](Self::run) returned.
pub struct Controller {
    pipeline: DecisionPipeline,
    source: Box<dyn ClassifierSource>,
    sink: Box<dyn ActuatorSink>,
    delivery: DeliveryPolicy,
    stop_flag: Arc<AtomicBool>,
    summary: RunSummary,
}

impl Controller {
    pub fn new(
        pipeline: DecisionPipeline,
        source: Box<dyn ClassifierSource>,
        sink: Box<dyn ActuatorSink>,
        delivery: DeliveryPolicy,
    ) -> Self {
        Self {
            pipeline,
            source,
            sink,
            delivery,
            stop_flag: Arc::new(AtomicBool::new(false)),
            summary: RunSummary::new(),
        }
    }

    /// Share an externally owned stop flag, e.g. one set from a signal handler.
    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = stop_flag;
        self
    }

    /// Run cycles until the stop flag is set or the source is exhausted.
    ///
    /// Returns early only on a fatal error.
    pub fn run(&mut self) -> StepsortResult<RunSummary> {
        self.summary.started_at = Utc::now();
        tracing::info!(
            source = %self.source.name(),
            sink = %self.sink.name(),
            threshold = self.pipeline.filter().threshold(),
            capacity = self.pipeline.state().history.capacity(),
            "Controller started"
        );

        while !self.stop_flag.load(Ordering::Relaxed) {
            match self.run_cycle() {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(source = %self.source.name(), "Source exhausted");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, cycle = self.summary.cycles, "Fatal error; stopping");
                    return Err(e);
                }
            }
        }

        tracing::info!(
            cycles = self.summary.cycles,
            dispatches = self.summary.dispatches,
            sink_failures = self.summary.sink_failures,
            "Controller stopped"
        );
        Ok(self.summary.clone())
    }

    /// Run a single cycle. Returns `Ok(false)` once the source is exhausted.
    pub fn run_cycle(&mut self) -> StepsortResult<bool> {
        let event = match self.source.poll() {
            Ok(Some(event)) => {
                self.summary.events_received += 1;
                Some(event)
            }
            Ok(None) => return Ok(false),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping cycle");
                self.summary.capture_failures += 1;
                None
            }
        };
        self.summary.cycles += 1;

        let outcome = self.pipeline.cycle(event.as_ref())?;
        if outcome.accepted {
            self.summary.events_accepted += 1;
        }
        if let Some(command) = outcome.command {
            self.deliver(&command);
        }
        Ok(true)
    }

    /// Write a command, retrying with backoff. Failures are logged, not raised.
    fn deliver(&mut self, command: &DispatchCommand) {
        let mut backoff = self.delivery.backoff;
        for attempt in 0..=self.delivery.retries {
            if attempt > 0 {
                std::thread::sleep(backoff);
                backoff = backoff.saturating_mul(2);
            }
            match self.sink.send(command) {
                Ok(()) => {
                    self.pipeline.confirm(command);
                    self.summary.dispatches += 1;
                    self.summary.last_position = Some(command.position);
                    tracing::info!(
                        position = %command.position,
                        label = %command.label,
                        "Dispatched position"
                    );
                    return;
                }
                Err(e) => {
                    tracing::debug!(error = %e, attempt, "Actuator write failed");
                }
            }
        }

        self.summary.sink_failures += 1;
        tracing::warn!(
            position = %command.position,
            attempts = self.delivery.retries + 1,
            "Giving up on command; will retry on a later cycle"
        );
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn pipeline(&self) -> &DecisionPipeline {
        &self.pipeline
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}
