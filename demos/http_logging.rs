//! HTTP logging example
//!
//! Sends every record to an HTTP collector configured from `LOGGER_*`
//! environment variables and reports delivery events.
//!
//! Run with:
//! LOGGER_HTTP_URL=http://127.0.0.1:8080/ingest cargo run --example http_logging

use rust_context_logger::core::config::LOGGER_HTTP_URL_ENV;
use rust_context_logger::prelude::*;
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Context Logger - HTTP Logging Example ===\n");

    let options = LoggerOptions::from_env();
    if options.http.is_none() {
        println!("{} is not set; nothing will be sent", LOGGER_HTTP_URL_ENV);
    }

    let logger = options
        .into_builder()
        .payload(|fields| json!({ "service": "http-demo", "record": fields }))
        .build()?;
    let mut events = logger.subscribe();

    logger.log("Service started", "HttpDemo");
    logger.warn("Cache is cold", LogContext::named("HttpDemo").with_field("entries", 0));
    logger.error(
        Message::from_error(&std::io::Error::other("database unreachable")),
        None,
        LogContext::named("HttpDemo").with_field("requestId", "r1"),
    );

    let expected = 3 * logger.appender_count();
    for _ in 0..expected {
        match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
            Ok(Ok(DeliveryEvent::Logged { sink, record })) => {
                println!("delivered to {}: {}", sink, record.message)
            }
            Ok(Ok(DeliveryEvent::Warn { sink, error })) => {
                println!("delivery to {} failed: {}", sink, error)
            }
            _ => break,
        }
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
