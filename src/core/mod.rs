//! Core logger types and traits

pub mod appender;
pub mod config;
pub mod context_resolver;
pub mod error;
pub mod events;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod output_format;

pub use appender::Appender;
pub use config::LoggerOptions;
pub use context_resolver::{ContextFactory, ContextResolver, RequestInfo, StaticContext};
pub use error::{LoggerError, Result};
pub use events::DeliveryEvent;
pub use log_context::{is_empty_value, CallContext, LogContext};
pub use log_entry::{LogRecord, Message};
pub use log_level::{LevelFilter, LogLevel};
pub use logger::{Logger, LoggerBuilder, RequestLogger};
pub use output_format::{PayloadTransform, RecordFormatter};
