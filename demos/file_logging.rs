//! File logging example
//!
//! Demonstrates writing JSON lines to a daily rotating file alongside the
//! console.
//!
//! Run with: cargo run --example file_logging

use rust_context_logger::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Context Logger - File Logging Example ===\n");

    let dir = std::env::temp_dir().join("rust_context_logger_demo");
    let options = DailyRotateOptions::new("application-%DATE%.log", &dir).with_zipped_archive(true);

    let logger = Logger::builder()
        .context("FileDemo")
        .daily_file(options)
        .log_entries(["timestamp", "level", "context", "message"])
        .build()?;
    let mut events = logger.subscribe();

    println!("1. Logging to both console and file:");
    logger.log("Application started", ());
    logger.debug("Loading configuration...", ());
    logger.warn("Using default settings for some options", ());
    logger.error(Message::failure("Failed to load optional plugin"), Some("at plugins::load"), ());

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        logger.log(
            format!("Processing item {}/5", i),
            LogContext::new().with_field("item", i),
        );
    }

    // Writes are fire-and-forget; wait for each delivery before exiting
    for _ in 0..9 {
        match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
            Ok(Ok(DeliveryEvent::Warn { error, .. })) => eprintln!("write failed: {}", error),
            Ok(Ok(_)) => {}
            _ => break,
        }
    }

    println!("\n=== Example completed successfully! ===");
    println!("Check {} for the JSON log lines", dir.display());

    Ok(())
}
