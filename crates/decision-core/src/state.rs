//! Per-run mutable state of the decision pipeline.

use stepsort_model::Position;

use crate::history::HistoryBuffer;

/// Everything the pipeline remembers between cycles.
///
/// `history` is only written by the accept path; `last_dispatched` only
/// by the [`DispatchGate`](crate::DispatchGate).
#[derive(Debug, Clone)]
pub struct SessionState {
    pub history: HistoryBuffer,
    pub last_dispatched: Option<Position>,
}

impl SessionState {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: HistoryBuffer::new(capacity),
            last_dispatched: None,
        }
    }
}
