//! Stepsort Model
//!
//! Defines the data contracts shared by the decision pipeline and its
//! collaborators:
//! - **Events:** Classification results and the JSONL record format the
//!   classifier speaks
//! - **Commands:** Actuator positions and their wire encoding
//! - **Table:** The closed label set and its label-to-position mapping

pub mod event;
pub mod table;

pub use event::*;
pub use table::*;
