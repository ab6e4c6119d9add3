//! Basic logger usage example
//!
//! Demonstrates console logging, thresholds, static and call context, and
//! request-scoped loggers.
//!
//! Run with: cargo run --example basic_usage

use rust_context_logger::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
    println!("=== Rust Context Logger - Basic Usage Example ===\n");

    // Console-only logger; no runtime needed
    let logger = Logger::builder()
        .level(LogLevel::Verbose)
        .context("Bootstrap")
        .build()?;

    println!("1. Logging at different levels:");
    logger.error("This is an error message", None, ());
    logger.warn("This is a warning message", ());
    logger.log("This is a log message", ());
    logger.debug("This is a debug message", ());
    logger.verbose("This is a verbose message", ());

    println!("\n2. Changing the threshold at runtime:");
    logger.set_level("warn");
    println!("   Threshold set to WARN - log, debug and verbose won't show:");
    logger.log("Log message (hidden)", ());
    logger.debug("Debug message (hidden)", ());
    logger.warn("Warning message (visible)", ());

    logger.set_level("shout");
    println!("   Unknown level name ignored, threshold is still {}", logger.level());

    println!("\n3. Call context:");
    logger.set_min_level(LogLevel::Debug);
    logger.log("Named source", "Payments");
    logger.debug(
        "Structured fields",
        LogContext::named("Payments").with_field("orderId", 42).with_field("note", ""),
    );

    println!("\n4. Request-scoped logger:");
    let request = RequestInfo::new("GET", "/orders/42?expand=items")
        .with_ip("127.0.0.1")
        .with_user_agent("curl/8.0")
        .with_query(json!({ "expand": "items" }));
    let scoped = logger.for_request(request).with_source("OrdersController");
    scoped.log("Order fetched", ());
    scoped.error(
        Message::from_error(&std::io::Error::other("upstream timed out")),
        None,
        (),
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
