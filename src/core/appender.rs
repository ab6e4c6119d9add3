//! Appender trait for structured log destinations

use super::{error::Result, log_entry::LogRecord};
use async_trait::async_trait;

/// Asynchronous destination for structured [`LogRecord`]s.
///
/// The logger spawns one `append` call per record and sink on its runtime and
/// never awaits it on the caller's thread. The outcome is published as a
/// [`DeliveryEvent`](super::DeliveryEvent).
///
/// # Example
///
/// ```no_run
/// use rust_context_logger::core::{Appender, LogRecord, Result};
/// use async_trait::async_trait;
///
/// struct Discard;
///
/// #[async_trait]
/// impl Appender for Discard {
///     async fn append(&self, _record: &LogRecord) -> Result<()> {
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "discard"
///     }
/// }
/// ```
#[async_trait]
pub trait Appender: Send + Sync {
    /// Format and deliver one record
    async fn append(&self, record: &LogRecord) -> Result<()>;

    /// Get the appender name
    fn name(&self) -> &str;
}
