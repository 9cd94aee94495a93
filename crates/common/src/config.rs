//! Application configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StepsortError, StepsortResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Decision pipeline tuning.
    pub pipeline: PipelineConfig,

    /// Known classes in classifier output order, with their actuator positions.
    pub classes: Vec<ClassEntry>,

    /// Classifier source settings.
    pub source: SourceConfig,

    /// Actuator sink settings.
    pub sink: SinkConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Decision pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum confidence for an event to enter the history buffer.
    pub confidence_threshold: f64,

    /// Number of accepted labels the majority vote runs over.
    pub buffer_capacity: usize,
}

/// One entry of the label-to-position table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub label: String,
    pub position: u32,
}

/// Classifier source parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// How long a single cycle waits for a classification before giving up.
    pub poll_timeout_ms: u64,
}

/// Actuator sink parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Byte-stream device the commands are written to (e.g. a serial TTY).
    pub device: PathBuf,

    /// Serial line speed. The port is always opened raw, 8N1.
    pub baud_rate: u32,

    /// Delay after opening the device before the first write.
    /// Many microcontroller boards reset when the port opens.
    pub settle_ms: u64,

    /// Extra write attempts after a failed command write.
    pub retries: u32,

    /// Backoff before the first retry; doubled on each further attempt.
    pub retry_backoff_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "stepsort_link=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            classes: default_classes(),
            source: SourceConfig::default(),
            sink: SinkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            buffer_capacity: 10,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 1000,
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 9600,
            settle_ms: 2000,
            retries: 2,
            retry_backoff_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn default_classes() -> Vec<ClassEntry> {
    ["bearing", "nut", "screw", "empty"]
        .iter()
        .zip(0u32..)
        .map(|(label, position)| ClassEntry {
            label: (*label).to_string(),
            position,
        })
        .collect()
}

impl AppConfig {
    /// Load config from the standard location.
    ///
    /// Defaults apply only when no file exists there. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load() -> StepsortResult<Self> {
        Self::load_or_default(&config_file_path())
    }

    /// Like [`load_from`](Self::load_from), but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> StepsortResult<Self> {
        match Self::load_from(path) {
            Err(StepsortError::FileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load config from an explicit path. Missing or malformed files are errors.
    pub fn load_from(path: &Path) -> StepsortResult<Self> {
        if !path.exists() {
            return Err(StepsortError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| StepsortError::config(format!("{}: {e}", path.display())))
    }

    /// Save config to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> StepsortResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check the invariants the decision pipeline relies on.
    pub fn validate(&self) -> StepsortResult<()> {
        let threshold = self.pipeline.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(StepsortError::config(format!(
                "confidence_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.pipeline.buffer_capacity == 0 {
            return Err(StepsortError::config("buffer_capacity must be at least 1"));
        }
        if self.sink.baud_rate == 0 {
            return Err(StepsortError::config("baud_rate must be positive"));
        }
        if self.source.poll_timeout_ms == 0 {
            return Err(StepsortError::config("poll_timeout_ms must be at least 1"));
        }
        validate_classes(&self.classes)
    }
}

/// Labels must be unique and positions must be exactly `0..K`.
pub fn validate_classes(classes: &[ClassEntry]) -> StepsortResult<()> {
    if classes.is_empty() {
        return Err(StepsortError::config("at least one class is required"));
    }

    let mut labels = HashSet::new();
    let mut positions = vec![false; classes.len()];
    for entry in classes {
        if entry.label.trim().is_empty() {
            return Err(StepsortError::config("class labels must not be empty"));
        }
        if !labels.insert(entry.label.as_str()) {
            return Err(StepsortError::config(format!(
                "duplicate class label {:?}",
                entry.label
            )));
        }
        let slot = positions.get_mut(entry.position as usize).ok_or_else(|| {
            StepsortError::config(format!(
                "position {} for {:?} is outside 0..{}",
                entry.position,
                entry.label,
                classes.len()
            ))
        })?;
        if *slot {
            return Err(StepsortError::config(format!(
                "position {} is assigned to more than one class",
                entry.position
            )));
        }
        *slot = true;
    }
    Ok(())
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("stepsort").join("config.json")
}
