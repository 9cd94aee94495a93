//! Stepsort Link
//!
//! Connects the decision pipeline to the outside world:
//!
//! - **Sources:** where classifications come from (a JSONL stream from the
//!   classifier process, or a scripted list for replays and tests)
//! - **Sinks:** where actuator commands go (a serial device, stdout, memory)
//! - **Controller:** the synchronous, cancellable cycle loop tying them together
//!
//! Only configuration errors stop the loop. Capture and write failures are
//! logged and contained within the cycle where they happen.

pub mod controller;
pub mod sink;
pub mod source;

use stepsort_common::error::StepsortResult;
use stepsort_model::{ClassificationEvent, DispatchCommand};

pub use controller::{Controller, DeliveryPolicy, RunSummary};
pub use sink::{open_device, stdout_sink, WriterSink};
pub use source::{LineSource, ScriptedSource};

/// Trait for classifier sources.
pub trait ClassifierSource: Send {
    /// Block until the next classification, bounded by the source's timeout.
    ///
    /// `Ok(None)` means the stream has ended. Non-fatal errors skip the cycle.
    fn poll(&mut self) -> StepsortResult<Option<ClassificationEvent>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Trait for actuator sinks.
pub trait ActuatorSink: Send {
    /// Deliver one command.
    fn send(&mut self, command: &DispatchCommand) -> StepsortResult<()>;

    /// Sink name for logging.
    fn name(&self) -> &str;
}
