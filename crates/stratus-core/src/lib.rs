//! Core application plumbing for Stratus: configuration and logging.

pub mod config;

pub use config::{CacheConfig, Config, MeteoConfig, ValidationResult};

use anyhow::Result;

/// Initialize tracing for the application.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Stratus core initialized");
    Ok(())
}
