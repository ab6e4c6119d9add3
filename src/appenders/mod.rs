//! Appender implementations

pub mod console;
pub mod http;
pub mod rotating_file;

pub use console::ConsoleAppender;
pub use http::{Endpoint, HttpAppender, HttpAuth, HttpOptions};
pub use rotating_file::{DailyRotateFileAppender, DailyRotateOptions};

pub use crate::core::Appender;
