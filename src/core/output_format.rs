//! Structured output formatting
//!
//! Turns a [`LogRecord`] into the single JSON line handed to a structured
//! sink:
//! - stamps `timestamp` (epoch millis) at format time,
//! - orders fields by the configured allowlist,
//! - runs the optional payload transform,
//! - serializes in one pass.

use super::error::Result;
use super::log_entry::LogRecord;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Rewrites the ordered field object before serialization
pub type PayloadTransform = Arc<dyn Fn(Map<String, Value>) -> Value + Send + Sync>;

#[derive(Clone, Default)]
pub struct RecordFormatter {
    allowlist: Vec<String>,
    transform: Option<PayloadTransform>,
}

impl RecordFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields emitted first, in this order
    #[must_use]
    pub fn with_allowlist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowlist = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: PayloadTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn allowlist(&self) -> &[String] {
        &self.allowlist
    }

    pub fn format(&self, record: &LogRecord) -> Result<String> {
        let mut fields = record.to_fields();
        fields.insert(
            "timestamp".into(),
            Value::from(chrono::Utc::now().timestamp_millis()),
        );

        let ordered = partition(fields, &self.allowlist);
        let payload = match &self.transform {
            Some(transform) => transform(ordered),
            None => Value::Object(ordered),
        };

        Ok(serde_json::to_string(&payload)?)
    }
}

/// Allowlisted keys first in allowlist order, the rest in insertion order
pub fn partition(mut fields: Map<String, Value>, allowlist: &[String]) -> Map<String, Value> {
    if allowlist.is_empty() {
        return fields;
    }

    let mut ordered = Map::new();
    for key in allowlist {
        // shift_remove keeps the remaining keys in insertion order
        if let Some(value) = fields.shift_remove(key.as_str()) {
            ordered.insert(key.clone(), value);
        }
    }
    ordered.extend(fields);
    ordered
}

impl fmt::Debug for RecordFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordFormatter")
            .field("allowlist", &self.allowlist)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .finish()
    }
}
