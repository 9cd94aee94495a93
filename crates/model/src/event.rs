//! Classification events, actuator commands, and the classifier record format.
//!
//! The classifier speaks JSONL: one record per processed frame, either an
//! already-decided `{"label", "confidence"}` pair or a raw per-class score
//! vector that is decoded against the [`PositionTable`](crate::PositionTable).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A class name from the closed set known at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Dense actuator setpoint index in `0..K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(pub u32);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One classifier result for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    pub label: Label,

    /// Classifier certainty in `[0.0, 1.0]`.
    pub confidence: f64,
}

impl ClassificationEvent {
    pub fn new(label: impl Into<Label>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// A command for the actuator to move to `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCommand {
    pub position: Position,

    /// The resolved label that produced this position. Not sent on the wire.
    pub label: Label,
}

impl DispatchCommand {
    /// Wire encoding: the decimal position followed by a newline.
    pub fn encode(&self) -> String {
        format!("{}\n", self.position)
    }
}

/// A raw line from the classifier, before it is checked against the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassifierRecord {
    /// The classifier already picked a class.
    Labelled { label: Label, confidence: f64 },

    /// Per-class scores in the table's class order.
    Scores { scores: Vec<f64> },
}

/// Parse a single JSONL line. Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_record(line: &str) -> Result<Option<ClassifierRecord>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Parse records from JSONL content (one JSON object per line).
pub fn parse_records(jsonl: &str) -> Result<Vec<ClassifierRecord>, serde_json::Error> {
    jsonl
        .lines()
        .filter_map(|line| parse_record(line).transpose())
        .collect()
}
