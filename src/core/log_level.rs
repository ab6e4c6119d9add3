//! Log level definitions and the threshold filter

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Application severities, most severe first.
///
/// The discriminant is the fixed priority: a lower value is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Log = 2,
    Debug = 3,
    #[default]
    Verbose = 4,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Log,
        LogLevel::Debug,
        LogLevel::Verbose,
    ];

    pub fn priority(&self) -> u8 {
        *self as u8
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Log => "log",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
        }
    }

    /// Name used in structured output, where `log` is spelled `info`
    pub fn backend_name(&self) -> &'static str {
        match self {
            LogLevel::Log => "info",
            other => other.to_str(),
        }
    }

    /// Reverse of [`LogLevel::backend_name`]
    pub fn from_backend_name(name: &str) -> Option<Self> {
        match name {
            "info" => Some(LogLevel::Log),
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "debug" => Some(LogLevel::Debug),
            "verbose" => Some(LogLevel::Verbose),
            _ => None,
        }
    }

    /// Exact severity name lookup: no aliases, case-sensitive
    pub fn from_name(name: &str) -> Option<Self> {
        LogLevel::ALL.into_iter().find(|level| level.to_str() == name)
    }

    /// Whether a record at `self` passes a `threshold`
    #[inline]
    pub fn permits(self, threshold: LogLevel) -> bool {
        self.priority() <= threshold.priority()
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Error => Red,
            LogLevel::Warn => Yellow,
            LogLevel::Log => Green,
            LogLevel::Debug => Magenta,
            LogLevel::Verbose => Cyan,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::from_name(s).ok_or_else(|| format!("Invalid log level: '{}'", s))
    }
}

/// Active threshold owned by one logger.
///
/// Reads happen on every logging call, writes only through
/// [`LevelFilter::set_level`] / [`LevelFilter::set_min_level`].
#[derive(Debug, Default)]
pub struct LevelFilter {
    threshold: RwLock<LogLevel>,
}

impl LevelFilter {
    pub fn new(threshold: LogLevel) -> Self {
        Self {
            threshold: RwLock::new(threshold),
        }
    }

    pub fn threshold(&self) -> LogLevel {
        *self.threshold.read()
    }

    pub fn permits(&self, level: LogLevel) -> bool {
        level.permits(self.threshold())
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.threshold.write() = level;
    }

    /// Update the threshold from a level name.
    ///
    /// Unknown names are ignored and the previous threshold is kept.
    pub fn set_level(&self, name: &str) {
        if let Some(level) = LogLevel::from_name(name) {
            self.set_min_level(level);
        }
    }
}
