// ABOUTME: Production logging setup built on tracing and tracing-subscriber
// ABOUTME: Honors RUST_LOG when present, falls back to the configured level
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Logging initialization
//!
//! Structured logs via `tracing`. Token and password values are never
//! logged; auth decisions log subjects and outcomes only.

use crate::config::environment::LogLevel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the configured level
/// applies to this crate and `info` to dependencies.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_from_level(level: LogLevel) -> anyhow::Result<()> {
    let default_directive = format!("info,portfolio_api={level}");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}
