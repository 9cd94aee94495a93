//! One-cycle orchestration of filter, history, resolver, mapper, and gate.
//!
//! # States
//!
//! - **Warming:** the history buffer is not yet full. Accepted labels are
//!   pushed; nothing is resolved or dispatched.
//! - **Stable:** the buffer is full. Every cycle resolves the majority,
//!   maps it to a position, and asks the gate whether to dispatch, even
//!   when the cycle's own event was dropped by the filter.
//!
//! The switch to Stable happens on the push that fills the buffer and is
//! never undone.

use stepsort_common::config::AppConfig;
use stepsort_common::error::{StepsortError, StepsortResult};
use stepsort_model::{ClassificationEvent, DispatchCommand, Label, Position, PositionTable};

use crate::filter::ConfidenceFilter;
use crate::gate::DispatchGate;
use crate::resolver::MajorityResolver;
use crate::state::SessionState;

/// Where the pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warming,
    Stable,
}

/// What happened during a single cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// Phase at the end of the cycle.
    pub phase: Phase,

    /// The cycle had no event (capture failed) and changed nothing.
    pub skipped: bool,

    /// The cycle's event passed the confidence filter.
    pub accepted: bool,

    /// Majority label and its position, when the buffer was full.
    pub resolved: Option<(Label, Position)>,

    /// Command to send. Not yet recorded: call [`DecisionPipeline::confirm`]
    /// once the actuator accepted it.
    pub command: Option<DispatchCommand>,
}

/// The decision pipeline for one session.
#[derive(Debug, Clone)]
pub struct DecisionPipeline {
    filter: ConfidenceFilter,
    resolver: MajorityResolver,
    gate: DispatchGate,
    table: PositionTable,
    state: SessionState,
}

impl DecisionPipeline {
    pub fn new(filter: ConfidenceFilter, table: PositionTable, capacity: usize) -> Self {
        Self {
            filter,
            resolver: MajorityResolver,
            gate: DispatchGate,
            table,
            state: SessionState::new(capacity),
        }
    }

    /// Build a pipeline from validated application configuration.
    pub fn from_config(config: &AppConfig) -> StepsortResult<Self> {
        config.validate()?;
        let table = PositionTable::from_entries(&config.classes)?;
        Ok(Self::new(
            ConfidenceFilter::new(config.pipeline.confidence_threshold),
            table,
            config.pipeline.buffer_capacity,
        ))
    }

    pub fn phase(&self) -> Phase {
        if self.state.history.is_full() {
            Phase::Stable
        } else {
            Phase::Warming
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn table(&self) -> &PositionTable {
        &self.table
    }

    pub fn filter(&self) -> &ConfidenceFilter {
        &self.filter
    }

    /// Run one cycle.
    ///
    /// `None` means the classifier produced nothing this cycle; the state is
    /// left untouched and nothing is resolved. A label outside the position
    /// table is fatal.
    pub fn cycle(&mut self, event: Option<&ClassificationEvent>) -> StepsortResult<CycleOutcome> {
        let Some(event) = event else {
            return Ok(CycleOutcome {
                phase: self.phase(),
                skipped: true,
                accepted: false,
                resolved: None,
                command: None,
            });
        };

        if !self.table.contains(&event.label) {
            return Err(StepsortError::unknown_label(event.label.as_str()));
        }

        let accepted = match self.filter.accept(event) {
            Some(label) => {
                let was_full = self.state.history.is_full();
                self.state.history.push(label);
                if !was_full && self.state.history.is_full() {
                    tracing::info!(
                        capacity = self.state.history.capacity(),
                        "History buffer full; resolving every cycle"
                    );
                }
                true
            }
            None => {
                tracing::debug!(
                    label = %event.label,
                    confidence = event.confidence,
                    threshold = self.filter.threshold(),
                    "Dropped low-confidence event"
                );
                false
            }
        };

        let Some(label) = self.resolver.resolve(&self.state.history).cloned() else {
            return Ok(CycleOutcome {
                phase: Phase::Warming,
                skipped: false,
                accepted,
                resolved: None,
                command: None,
            });
        };

        let position = self.table.map(&label)?;
        let command = self.gate.pending(position, &label, &self.state);

        Ok(CycleOutcome {
            phase: Phase::Stable,
            skipped: false,
            accepted,
            resolved: Some((label, position)),
            command,
        })
    }

    /// Record that `command` reached the actuator.
    pub fn confirm(&mut self, command: &DispatchCommand) {
        self.gate.record(command, &mut self.state);
    }

    /// Run one cycle and record its command immediately.
    ///
    /// For callers whose delivery cannot fail, such as offline analysis.
    pub fn step(
        &mut self,
        event: Option<&ClassificationEvent>,
    ) -> StepsortResult<Option<DispatchCommand>> {
        let outcome = self.cycle(event)?;
        if let Some(command) = &outcome.command {
            self.confirm(command);
        }
        Ok(outcome.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepsort_common::config::ClassEntry;

    fn pipeline(threshold: f64, capacity: usize) -> DecisionPipeline {
        let entries = vec![
            ClassEntry {
                label: "A".to_string(),
                position: 0,
            },
            ClassEntry {
                label: "B".to_string(),
                position: 1,
            },
        ];
        let table = PositionTable::from_entries(&entries).unwrap();
        DecisionPipeline::new(ConfidenceFilter::new(threshold), table, capacity)
    }

    #[test]
    fn test_warming_never_dispatches() {
        let mut p = pipeline(0.7, 3);
        for _ in 0..2 {
            let outcome = p.cycle(Some(&ClassificationEvent::new("A", 0.9))).unwrap();
            assert_eq!(outcome.phase, Phase::Warming);
            assert!(outcome.command.is_none());
        }
    }

    #[test]
    fn test_filling_cycle_resolves() {
        let mut p = pipeline(0.7, 2);
        p.cycle(Some(&ClassificationEvent::new("B", 0.9))).unwrap();
        let outcome = p.cycle(Some(&ClassificationEvent::new("B", 0.9))).unwrap();
        assert_eq!(outcome.phase, Phase::Stable);
        assert_eq!(outcome.resolved, Some((Label::new("B"), Position(1))));
        assert_eq!(outcome.command.map(|c| c.position), Some(Position(1)));
    }

    #[test]
    fn test_skipped_cycle_changes_nothing() {
        let mut p = pipeline(0.7, 1);
        p.step(Some(&ClassificationEvent::new("A", 0.9))).unwrap();
        let before = p.state().history.snapshot();

        let outcome = p.cycle(None).unwrap();
        assert!(outcome.skipped);
        assert!(outcome.resolved.is_none());
        assert_eq!(p.state().history.snapshot(), before);
        assert_eq!(p.state().last_dispatched, Some(Position(0)));
    }

    #[test]
    fn test_unconfirmed_command_is_offered_again() {
        let mut p = pipeline(0.7, 1);
        let first = p.cycle(Some(&ClassificationEvent::new("B", 0.9))).unwrap();
        assert!(first.command.is_some());

        // Delivery failed: nothing confirmed, so the next cycle retries.
        let second = p.cycle(Some(&ClassificationEvent::new("B", 0.1))).unwrap();
        assert_eq!(second.command.map(|c| c.position), Some(Position(1)));
    }

    #[test]
    fn test_unknown_label_is_fatal_even_below_threshold() {
        let mut p = pipeline(0.7, 3);
        let err = p
            .cycle(Some(&ClassificationEvent::new("C", 0.1)))
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(p.state().history.is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = AppConfig::default();
        config.pipeline.buffer_capacity = 0;
        assert!(DecisionPipeline::from_config(&config).is_err());

        let config = AppConfig::default();
        let p = DecisionPipeline::from_config(&config).unwrap();
        assert_eq!(p.state().history.capacity(), 10);
        assert_eq!(p.table().len(), 4);
    }
}
