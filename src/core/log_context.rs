//! Structured logging context for key-value fields
//!
//! This module provides:
//! - `LogContext`: ordered key/value fields attached to a record
//! - `CallContext`: the normalized shape of a context passed to a logging call

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Key carrying the logical source name of a record
pub const SOURCE_KEY: &str = "context";

/// Context for structured logging with key-value fields.
///
/// Fields keep their insertion order; re-inserting an existing key replaces
/// the value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogContext {
    fields: Map<String, Value>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Context holding only a source name
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with_field(SOURCE_KEY, name.into())
    }

    /// Add a field to the context
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The `context` field, when it is a string
    pub fn source(&self) -> Option<&str> {
        self.fields.get(SOURCE_KEY).and_then(Value::as_str)
    }

    /// Get all fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Check if context has any fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Overlay `other` on top of `self`; keys from `other` win.
    ///
    /// Values are replaced whole, nested objects are not merged.
    pub fn merge(&mut self, other: LogContext) {
        for (key, value) in other.fields {
            self.fields.insert(key, value);
        }
    }

    #[must_use]
    pub fn merged(mut self, other: LogContext) -> Self {
        self.merge(other);
        self
    }

    /// Drop every field whose value is empty, see [`is_empty_value`]
    pub fn retain_non_empty(&mut self) {
        self.fields.retain(|_, value| !is_empty_value(value));
    }

    #[must_use]
    pub fn without_empty(mut self) -> Self {
        self.retain_non_empty();
        self
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Emptiness rule for context values.
///
/// Null, empty strings, empty arrays and empty objects are empty. Numbers
/// (zero included) and booleans never are.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) | Value::Bool(_) => false,
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl From<Map<String, Value>> for LogContext {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for LogContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Context supplied to a single logging call.
///
/// A bare string is a source name and is normalized to `{context: name}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CallContext {
    #[default]
    None,
    Source(String),
    Fields(LogContext),
}

impl CallContext {
    /// Normalize to a field map
    pub fn into_context(self) -> LogContext {
        match self {
            CallContext::None => LogContext::new(),
            CallContext::Source(name) => LogContext::named(name),
            CallContext::Fields(fields) => fields,
        }
    }
}

impl From<()> for CallContext {
    fn from(_: ()) -> Self {
        CallContext::None
    }
}

impl From<&str> for CallContext {
    fn from(name: &str) -> Self {
        CallContext::Source(name.to_string())
    }
}

impl From<String> for CallContext {
    fn from(name: String) -> Self {
        CallContext::Source(name)
    }
}

impl From<LogContext> for CallContext {
    fn from(fields: LogContext) -> Self {
        CallContext::Fields(fields)
    }
}

impl<T: Into<CallContext>> From<Option<T>> for CallContext {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// JSON objects become field maps, strings become source names.
impl From<Value> for CallContext {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => CallContext::Fields(map.into()),
            Value::String(name) => CallContext::Source(name),
            Value::Null => CallContext::None,
            other => CallContext::Source(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_context_creation() {
        let ctx = LogContext::new();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_log_context_with_fields() {
        let ctx = LogContext::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(ctx.len(), 3);
        let keys: Vec<&String> = ctx.fields().keys().collect();
        assert_eq!(keys, ["user_id", "username", "active"]);
    }

    #[test]
    fn test_log_context_format() {
        let ctx = LogContext::new()
            .with_field("key1", "value1")
            .with_field("key2", 42);

        assert_eq!(ctx.format_fields(), "key1=value1 key2=42");
    }

    #[test]
    fn test_merge_is_right_biased() {
        let base = LogContext::new().with_field("a", 1).with_field("b", 1);
        let merged = base.merged(LogContext::new().with_field("a", 2));

        assert_eq!(merged.get("a"), Some(&json!(2)));
        assert_eq!(merged.get("b"), Some(&json!(1)));
    }

    #[test]
    fn test_merge_replaces_nested_objects_whole() {
        let base = LogContext::new().with_field("user", json!({"id": 1, "name": "a"}));
        let merged = base.merged(LogContext::new().with_field("user", json!({"id": 2})));

        assert_eq!(merged.get("user"), Some(&json!({"id": 2})));
    }

    #[test]
    fn test_emptiness_rule() {
        let ctx = LogContext::new()
            .with_field("a", "")
            .with_field("b", 0)
            .with_field("c", json!([]))
            .with_field("d", json!({}))
            .with_field("e", Value::Null)
            .with_field("f", false)
            .with_field("g", "x")
            .without_empty();

        assert_eq!(ctx, LogContext::new().with_field("b", 0).with_field("f", false).with_field("g", "x"));
    }

    #[test]
    fn test_call_context_normalization() {
        assert_eq!(CallContext::from("Users").into_context(), LogContext::named("Users"));
        assert!(CallContext::from(()).into_context().is_empty());
        assert!(CallContext::from(None::<&str>).into_context().is_empty());

        let fields = CallContext::from(json!({"requestId": "r1"})).into_context();
        assert_eq!(fields.get("requestId"), Some(&json!("r1")));
    }

    #[test]
    fn test_source() {
        assert_eq!(LogContext::named("Billing").source(), Some("Billing"));
        assert_eq!(LogContext::new().with_field(SOURCE_KEY, 3).source(), None);
    }
}
