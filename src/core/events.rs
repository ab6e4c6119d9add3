//! Delivery notifications for structured sinks

use super::error::LoggerError;
use super::log_entry::LogRecord;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the event channel; slow subscribers observe `Lagged`
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Outcome of one delivery attempt. Exactly one event is sent per attempt.
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    /// The sink accepted the record
    Logged { sink: String, record: Arc<LogRecord> },
    /// The sink failed; the record is dropped
    Warn { sink: String, error: Arc<LoggerError> },
}

impl DeliveryEvent {
    pub fn sink(&self) -> &str {
        match self {
            DeliveryEvent::Logged { sink, .. } | DeliveryEvent::Warn { sink, .. } => sink,
        }
    }

    pub fn is_logged(&self) -> bool {
        matches!(self, DeliveryEvent::Logged { .. })
    }
}

pub(crate) fn channel() -> broadcast::Sender<DeliveryEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
