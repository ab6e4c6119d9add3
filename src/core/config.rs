//! Construction options
//!
//! [`LoggerOptions`] is the plain-data half of the logger configuration: it
//! deserializes from any serde format and can be read from the environment.
//! Closures (context factory, payload transform) are attached afterwards on
//! the [`LoggerBuilder`] returned by [`LoggerOptions::into_builder`].

use super::log_level::LogLevel;
use super::logger::LoggerBuilder;
use crate::appenders::{DailyRotateOptions, HttpAuth, HttpOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum level name, e.g. `warn`. Unknown names are ignored.
pub const LOGGER_LEVEL_ENV: &str = "LOGGER_LEVEL";

/// Static source name added to every record.
pub const LOGGER_CONTEXT_ENV: &str = "LOGGER_CONTEXT";

/// File name pattern for the daily file sink, e.g. `app-%DATE%.log`.
pub const LOGGER_FILENAME_ENV: &str = "LOGGER_FILENAME";

/// Directory of the daily file sink.
pub const LOGGER_DIRNAME_ENV: &str = "LOGGER_DIRNAME";

/// `true`/`1` to gzip rotated files.
pub const LOGGER_ZIPPED_ARCHIVE_ENV: &str = "LOGGER_ZIPPED_ARCHIVE";

/// Endpoint of the HTTP sink.
pub const LOGGER_HTTP_URL_ENV: &str = "LOGGER_HTTP_URL";

/// Optional basic-auth user name for the HTTP sink.
pub const LOGGER_HTTP_USERNAME_ENV: &str = "LOGGER_HTTP_USERNAME";

/// Optional basic-auth password for the HTTP sink.
pub const LOGGER_HTTP_PASSWORD_ENV: &str = "LOGGER_HTTP_PASSWORD";

/// Optional bearer token for the HTTP sink.
pub const LOGGER_HTTP_BEARER_ENV: &str = "LOGGER_HTTP_BEARER";

/// Comma separated field names emitted first.
pub const LOGGER_LOG_ENTRIES_ENV: &str = "LOGGER_LOG_ENTRIES";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerOptions {
    /// Kept as a name so that an unknown value can be ignored
    pub level: Option<String>,
    pub context: Option<String>,
    pub filename: Option<String>,
    pub dirname: Option<PathBuf>,
    pub zipped_archive: bool,
    pub http: Option<HttpOptions>,
    pub log_entries: Vec<String>,
}

impl LoggerOptions {
    /// Read options from `LOGGER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read options through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http = get(LOGGER_HTTP_URL_ENV).map(|url| {
            let auth = HttpAuth {
                username: get(LOGGER_HTTP_USERNAME_ENV),
                password: get(LOGGER_HTTP_PASSWORD_ENV),
                bearer: get(LOGGER_HTTP_BEARER_ENV),
            };
            let options = HttpOptions::new(url);
            if auth == HttpAuth::default() {
                options
            } else {
                options.with_auth(auth)
            }
        });

        Self {
            level: get(LOGGER_LEVEL_ENV),
            context: get(LOGGER_CONTEXT_ENV),
            filename: get(LOGGER_FILENAME_ENV),
            dirname: get(LOGGER_DIRNAME_ENV).map(PathBuf::from),
            zipped_archive: get(LOGGER_ZIPPED_ARCHIVE_ENV)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            http,
            log_entries: get(LOGGER_LOG_ENTRIES_ENV)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// The file sink is configured only when both filename and dirname are set
    pub fn file_options(&self) -> Option<DailyRotateOptions> {
        match (&self.filename, &self.dirname) {
            (Some(filename), Some(dirname)) => Some(
                DailyRotateOptions::new(filename.clone(), dirname.clone())
                    .with_zipped_archive(self.zipped_archive),
            ),
            _ => None,
        }
    }

    pub fn into_builder(self) -> LoggerBuilder {
        let mut builder = LoggerBuilder::new();

        if let Some(level) = self.level.as_deref().and_then(LogLevel::from_name) {
            builder = builder.level(level);
        }
        if let Some(options) = self.file_options() {
            builder = builder.daily_file(options);
        }
        if let Some(context) = self.context {
            builder = builder.context(context);
        }
        if let Some(http) = self.http {
            builder = builder.http(http);
        }
        if !self.log_entries.is_empty() {
            builder = builder.log_entries(self.log_entries);
        }
        builder
    }
}
