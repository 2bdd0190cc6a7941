//! Eco-Grid - content and tooling backend for a clean-energy platform
//!
//! Serves the public site's articles, case studies, testimonials, pilots and
//! roadmap, a savings calculator, a keyword chatbot and an AI article writer,
//! all gated by subscription tiers. Records live in memory; a background task
//! feeds synthetic grid telemetry.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;
pub mod types;

// Main functional modules
pub mod api;
pub mod security;
pub mod services;
pub mod storage;
pub mod system;

// Re-export commonly used items for convenience
pub use core::{AppState, Config, Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &core::config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{}={},tower_http=info", NAME.replace('-', "_"), config.level)))
        .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format.as_str() {
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
    installed.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!("Initializing {} v{}", NAME, VERSION);
    Ok(())
}
