//! The closed label set and its label-to-position mapping.

use std::collections::HashMap;

use stepsort_common::config::{validate_classes, ClassEntry};
use stepsort_common::error::{StepsortError, StepsortResult};

use crate::event::{ClassificationEvent, ClassifierRecord, Label, Position};

/// Total mapping from every known label to a distinct position in `0..K`.
///
/// Entries keep the classifier's class order so score vectors can be
/// decoded by index. Immutable once built.
#[derive(Debug, Clone)]
pub struct PositionTable {
    classes: Vec<Label>,
    positions: HashMap<Label, Position>,
}

impl PositionTable {
    /// Build a table from configuration entries, rejecting duplicates and
    /// non-dense position assignments.
    pub fn from_entries(entries: &[ClassEntry]) -> StepsortResult<Self> {
        validate_classes(entries)?;

        let classes: Vec<Label> = entries.iter().map(|e| Label::new(&e.label)).collect();
        let positions = entries
            .iter()
            .map(|e| (Label::new(&e.label), Position(e.position)))
            .collect();

        Ok(Self { classes, positions })
    }

    /// Position for a label. A label outside the table is a configuration error.
    pub fn map(&self, label: &Label) -> StepsortResult<Position> {
        self.positions
            .get(label)
            .copied()
            .ok_or_else(|| StepsortError::unknown_label(label.as_str()))
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.positions.contains_key(label)
    }

    /// Number of classes (`K`).
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Labels in classifier output order.
    pub fn labels(&self) -> &[Label] {
        &self.classes
    }

    /// Turn a raw classifier record into an event over the closed label set.
    ///
    /// Malformed records (bad confidence, wrong score count) are capture
    /// failures for the current cycle. A label the table does not know is
    /// an [`StepsortError::UnknownLabel`].
    pub fn decode(&self, record: ClassifierRecord) -> StepsortResult<ClassificationEvent> {
        let event = match record {
            ClassifierRecord::Labelled { label, confidence } => {
                ClassificationEvent { label, confidence }
            }
            ClassifierRecord::Scores { scores } => self.decode_scores(&scores)?,
        };

        if !self.contains(&event.label) {
            return Err(StepsortError::unknown_label(event.label.as_str()));
        }
        if !event.confidence.is_finite() || !(0.0..=1.0).contains(&event.confidence) {
            return Err(StepsortError::capture(format!(
                "confidence {} for {:?} is outside [0, 1]",
                event.confidence,
                event.label.as_str()
            )));
        }
        Ok(event)
    }

    /// Argmax over a score vector; the first maximum wins.
    fn decode_scores(&self, scores: &[f64]) -> StepsortResult<ClassificationEvent> {
        if scores.len() != self.classes.len() {
            return Err(StepsortError::capture(format!(
                "expected {} scores, got {}",
                self.classes.len(),
                scores.len()
            )));
        }
        if scores.iter().any(|s| s.is_nan()) {
            return Err(StepsortError::capture("score vector contains NaN"));
        }

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }

        Ok(ClassificationEvent {
            label: self.classes[best].clone(),
            confidence: scores[best],
        })
    }
}
