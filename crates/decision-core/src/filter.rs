//! Confidence gating for raw classifier events.

use stepsort_model::{ClassificationEvent, Label};

/// Accept `event` if its confidence reaches `threshold`.
///
/// Rejected events are dropped without a trace; they never reach the
/// history buffer.
pub fn accept(event: &ClassificationEvent, threshold: f64) -> Option<Label> {
    (event.confidence >= threshold).then(|| event.label.clone())
}

/// A confidence filter with a fixed threshold.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceFilter {
    threshold: f64,
}

impl ConfidenceFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accept(&self, event: &ClassificationEvent) -> Option<Label> {
        accept(event, self.threshold)
    }
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self::new(0.7)
    }
}
