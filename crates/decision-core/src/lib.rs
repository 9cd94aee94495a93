//! Stepsort Decision Core
//!
//! Turns a noisy stream of per-frame classifications into debounced
//! actuator commands:
//! - **Filter:** Drop events below a confidence threshold
//! - **History:** Keep the last `N` accepted labels in a ring buffer
//! - **Resolver:** Majority vote over the buffer, first occurrence breaks ties
//! - **Gate:** Emit a command only when the resolved position changes
//!
//! This crate is pure computation: no I/O, no clocks, no threads.
//! All inputs are data; all outputs are data.

pub mod filter;
pub mod gate;
pub mod history;
pub mod pipeline;
pub mod resolver;
pub mod state;

pub use filter::ConfidenceFilter;
pub use gate::DispatchGate;
pub use history::HistoryBuffer;
pub use pipeline::{CycleOutcome, DecisionPipeline, Phase};
pub use resolver::MajorityResolver;
pub use state::SessionState;
