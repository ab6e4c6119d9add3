//! Console appender implementation
//!
//! The developer-facing view: one line per record holding only the message
//! text and the source name, never the structured fields.

use crate::core::LogLevel;
use chrono::format::{Item, StrftimeItems};
#[cfg(feature = "console")]
use colored::Colorize;

/// Default strftime pattern for console timestamps
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone)]
pub struct ConsoleAppender {
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
    timestamp_format: String,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set a custom timestamp format using a strftime-compatible format string
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_context_logger::appenders::ConsoleAppender;
    ///
    /// let appender = ConsoleAppender::new()
    ///     .with_custom_timestamp("%d/%b/%Y:%H:%M:%S %z");
    /// ```
    ///
    /// An invalid pattern is ignored and the default format is kept.
    #[must_use]
    pub fn with_custom_timestamp(mut self, format_str: &str) -> Self {
        if is_valid_timestamp_format(format_str) {
            self.timestamp_format = format_str.to_string();
        } else {
            tracing::warn!(format = %format_str, "invalid console timestamp format, keeping default");
            self.timestamp_format = DEFAULT_TIMESTAMP_FORMAT.to_string();
        }
        self
    }

    /// Write one line; errors go to stderr, everything else to stdout
    pub fn write(&self, level: LogLevel, message: &str, source: Option<&str>) {
        let line = self.format_line(level, message, source);
        match level {
            LogLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    pub fn format_line(&self, level: LogLevel, message: &str, source: Option<&str>) -> String {
        let timestamp = chrono::Local::now().format(&self.timestamp_format);
        let level_str = self.paint_level(level);

        match source {
            Some(source) => format!(
                "[{}] {} {} [{}] {}",
                std::process::id(),
                timestamp,
                level_str,
                source,
                message
            ),
            None => format!("[{}] {} {} {}", std::process::id(), timestamp, level_str, message),
        }
    }

    fn paint_level(&self, level: LogLevel) -> String {
        let padded = format!("{:>7}", level.to_str().to_uppercase());

        #[cfg(feature = "console")]
        if self.use_colors {
            return padded.color(level.color_code()).to_string();
        }

        padded
    }
}

fn is_valid_timestamp_format(format_str: &str) -> bool {
    StrftimeItems::new(format_str).all(|item| !matches!(item, Item::Error))
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_with_source() {
        let console = ConsoleAppender::with_colors(false);
        let line = console.format_line(LogLevel::Log, "listening", Some("Bootstrap"));

        assert!(line.starts_with(&format!("[{}] ", std::process::id())));
        assert!(line.ends_with("    LOG [Bootstrap] listening"));
    }

    #[test]
    fn test_line_without_source() {
        let console = ConsoleAppender::with_colors(false);
        let line = console.format_line(LogLevel::Verbose, "tick", None);

        assert!(line.ends_with("VERBOSE tick"));
        assert_eq!(line.matches('[').count(), 1);
    }

    #[test]
    fn test_custom_timestamp() {
        let console = ConsoleAppender::with_colors(false).with_custom_timestamp("TS");
        let line = console.format_line(LogLevel::Warn, "w", None);

        assert_eq!(line, format!("[{}] TS    WARN w", std::process::id()));
    }

    #[test]
    fn test_invalid_timestamp_falls_back_to_default() {
        assert!(!is_valid_timestamp_format("%Q %Y"));
        assert!(is_valid_timestamp_format(DEFAULT_TIMESTAMP_FORMAT));

        let console = ConsoleAppender::with_colors(false)
            .with_custom_timestamp("TS")
            .with_custom_timestamp("%Q");
        assert_eq!(console.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);

        // Formatting must not panic
        let line = console.format_line(LogLevel::Error, "still logs", None);
        assert!(line.ends_with("  ERROR still logs"));
    }
}
