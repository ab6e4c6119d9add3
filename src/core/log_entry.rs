//! Log record structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

/// What a logging call was asked to record.
///
/// The shape is decided once when the record is created so that formatting
/// never has to inspect it again.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Plain(String),
    Failure { text: String, stack: Option<String> },
}

impl Message {
    /// Capture an error: its `Display` text plus its source chain as the stack
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + ?Sized,
    {
        Message::Failure {
            text: err.to_string(),
            stack: Some(render_chain(err)),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Message::Failure {
            text: text.into(),
            stack: None,
        }
    }

    /// Human-readable text, used by the console
    pub fn text(&self) -> &str {
        match self {
            Message::Plain(text) => text,
            Message::Failure { text, .. } => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Message::Failure { .. })
    }
}

fn render_chain<E: Error + ?Sized>(err: &E) -> String {
    let mut out = format!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!("\n    caused by: {}", cause));
        source = cause.source();
    }
    out
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Plain(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Plain(text)
    }
}

/// Objects exposing a `message` field are failures; anything else is plain.
impl From<Value> for Message {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Message::Plain(text),
            Value::Object(map) if map.contains_key("message") => {
                let text = match &map["message"] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let stack = map.get("stack").and_then(Value::as_str).map(str::to_string);
                Message::Failure { text, stack }
            }
            other => Message::Plain(other.to_string()),
        }
    }
}

/// One logging call, as handed to the structured sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: Message,
    pub context: LogContext,
    /// Explicit trace passed by the caller; takes precedence over the stack
    pub trace: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<Message>) -> Self {
        Self {
            level,
            message: message.into(),
            context: LogContext::new(),
            trace: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: Option<String>) -> Self {
        self.trace = trace;
        self
    }

    /// Field object `{level, message, trace?, ...context}` without a timestamp.
    ///
    /// Context keys overwrite the built-in ones, as an object spread would.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("level".into(), Value::from(self.level.backend_name()));

        match &self.message {
            Message::Plain(text) => {
                fields.insert("message".into(), Value::from(text.as_str()));
            }
            Message::Failure { text, stack } => {
                fields.insert("message".into(), Value::from(text.as_str()));
                let frame = self
                    .trace
                    .as_ref()
                    .or(stack.as_ref())
                    .map(|s| Value::from(s.as_str()))
                    .unwrap_or(Value::Null);
                fields.insert("trace".into(), Value::Array(vec![frame]));
            }
        }

        for (key, value) in self.context.fields() {
            fields.insert(key.clone(), value.clone());
        }
        fields
    }
}
