//! Edge-triggered dispatch.

use stepsort_model::{DispatchCommand, Label, Position};

use crate::state::SessionState;

/// Emits a command only when the resolved position changes.
///
/// `None` as the last dispatched position differs from everything, so the
/// first resolution of a session always dispatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchGate;

impl DispatchGate {
    /// Decide whether `position` needs a command, without recording it.
    pub fn pending(
        &self,
        position: Position,
        label: &Label,
        state: &SessionState,
    ) -> Option<DispatchCommand> {
        (state.last_dispatched != Some(position)).then(|| DispatchCommand {
            position,
            label: label.clone(),
        })
    }

    /// Mark `command` as delivered.
    pub fn record(&self, command: &DispatchCommand, state: &mut SessionState) {
        state.last_dispatched = Some(command.position);
    }

    /// [`pending`](Self::pending) followed by [`record`](Self::record).
    pub fn maybe_dispatch(
        &self,
        position: Position,
        label: &Label,
        state: &mut SessionState,
    ) -> Option<DispatchCommand> {
        let command = self.pending(position, label, state)?;
        self.record(&command, state);
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_resolution_always_dispatches() {
        let mut state = SessionState::new(3);
        let cmd = DispatchGate.maybe_dispatch(Position(0), &Label::new("a"), &mut state);
        assert_eq!(cmd.map(|c| c.position), Some(Position(0)));
        assert_eq!(state.last_dispatched, Some(Position(0)));
    }

    #[test]
    fn test_same_position_is_suppressed() {
        let mut state = SessionState::new(3);
        state.last_dispatched = Some(Position(2));
        let cmd = DispatchGate.maybe_dispatch(Position(2), &Label::new("c"), &mut state);
        assert!(cmd.is_none());
        assert_eq!(state.last_dispatched, Some(Position(2)));
    }

    #[test]
    fn test_change_dispatches_and_records() {
        let mut state = SessionState::new(3);
        state.last_dispatched = Some(Position(2));
        let cmd = DispatchGate
            .maybe_dispatch(Position(1), &Label::new("b"), &mut state)
            .unwrap();
        assert_eq!(cmd.encode(), "1\n");
        assert_eq!(state.last_dispatched, Some(Position(1)));
    }

    #[test]
    fn test_pending_does_not_mutate() {
        let state = SessionState::new(3);
        assert!(DispatchGate
            .pending(Position(1), &Label::new("b"), &state)
            .is_some());
        assert_eq!(state.last_dispatched, None);
    }
}
