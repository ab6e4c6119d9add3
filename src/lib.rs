//! # Rust Context Logger
//!
//! A logging facade that enriches every record with request-derived context
//! and fans it out to several sinks.
//!
//! ## Features
//!
//! - **Severity methods**: `error`, `warn`, `log`, `debug`, `verbose` with a
//!   per-logger threshold
//! - **Layered context**: static, request-derived and per-call fields
//! - **Console**: human-readable developer output
//! - **Structured sinks**: daily rotating JSON files and HTTP endpoints,
//!   delivered fire-and-forget with `logged`/`warn` events

pub mod appenders;
pub mod core;

pub mod prelude {
    pub use crate::appenders::{
        ConsoleAppender, DailyRotateFileAppender, DailyRotateOptions, HttpAppender, HttpAuth,
        HttpOptions,
    };
    pub use crate::core::{
        Appender, CallContext, DeliveryEvent, LogContext, LogLevel, LogRecord, Logger,
        LoggerBuilder, LoggerError, LoggerOptions, Message, RecordFormatter, RequestInfo,
        RequestLogger, Result, StaticContext,
    };
}

pub use appenders::{ConsoleAppender, DailyRotateFileAppender, HttpAppender};
pub use core::{
    Appender, CallContext, ContextResolver, DeliveryEvent, LevelFilter, LogContext, LogLevel,
    LogRecord, Logger, LoggerBuilder, LoggerError, LoggerOptions, Message, RecordFormatter,
    RequestInfo, RequestLogger, Result, StaticContext,
};
