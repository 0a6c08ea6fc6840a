//! Append-only progress and error logs carried on the pipeline state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

/// Severity attached to a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

/// A single timestamped entry in the progress log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub stage: String,
    pub message: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Append-only record of stage progress.
///
/// Every recorded event is mirrored to `tracing` at the matching level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressLog {
    events: Vec<ProgressEvent>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event without extra data
    pub fn emit(&mut self, stage: &str, message: impl Into<String>, level: Level) {
        self.emit_with(stage, message, level, Map::new());
    }

    /// Record an event carrying structured data
    pub fn emit_with(
        &mut self,
        stage: &str,
        message: impl Into<String>,
        level: Level,
        data: Map<String, Value>,
    ) {
        let message = message.into();
        match level {
            Level::Debug => debug!(stage, "{message}"),
            Level::Info | Level::Success => info!(stage, "{message}"),
            Level::Warning => warn!(stage, "{message}"),
            Level::Error => error!(stage, "{message}"),
        }

        self.events.push(ProgressEvent {
            timestamp: Utc::now(),
            level,
            stage: stage.to_string(),
            message,
            data,
        });
    }

    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events recorded for a given stage name
    pub fn for_stage<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a ProgressEvent> {
        self.events.iter().filter(move |event| event.stage == stage)
    }
}

/// Structured failure with a stable code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl ErrorRecord {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), details: Map::new() }
    }

    /// Attach one detail entry
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Attach the offending file path
    pub fn for_file(self, file: &str) -> Self {
        self.with("file", file)
    }
}

/// Monotonic error list; entries are never removed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLog {
    records: Vec<ErrorRecord>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ErrorRecord) {
        warn!(code = %record.code, "{}", record.message);
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ErrorRecord>) {
        for record in records {
            self.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.records.iter().any(|record| record.code == code)
    }

    pub fn as_slice(&self) -> &[ErrorRecord] {
        &self.records
    }
}

/// Build a JSON object map from key/value pairs
#[macro_export]
macro_rules! data {
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut map = serde_json::Map::new();
        $(map.insert($key.to_string(), serde_json::json!($value));)*
        map
    }};
}
