//! Error types shared across Stepsort crates.

use std::path::PathBuf;

/// Top-level error type for Stepsort operations.
#[derive(Debug, thiserror::Error)]
pub enum StepsortError {
    /// The classifier/capture step produced nothing usable for this cycle.
    #[error("Capture error: {message}")]
    Capture { message: String },

    /// Writing a command to the actuator failed.
    #[error("Sink error: {message}")]
    Sink { message: String },

    /// The classifier emitted a label that is not in the position table.
    #[error("Unknown label {label:?}: not present in the position table")]
    UnknownLabel { label: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using StepsortError.
pub type StepsortResult<T> = Result<T, StepsortError>;

impl StepsortError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unknown_label(label: impl Into<String>) -> Self {
        Self::UnknownLabel {
            label: label.into(),
        }
    }

    /// Whether this error must end the session.
    ///
    /// Only configuration errors are fatal. Capture and sink failures are
    /// contained within the cycle that produced them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownLabel { .. } | Self::Config { .. } | Self::FileNotFound { .. }
        )
    }
}
