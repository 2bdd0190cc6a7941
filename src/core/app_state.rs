//! Shared application state
//!
//! One [`AppState`] is built at startup by [`crate::core::factory`] and cloned
//! into every request handler. All fields are cheap to clone.

use std::sync::Arc;
use std::time::Instant;

use crate::core::config::Config;
use crate::security::TokenSigner;
use crate::services::{AiWriter, Chatbot, TelemetryMonitor};
use crate::storage::SharedStore;

/// Services and data shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Record collections
    pub store: SharedStore,
    /// Validated configuration
    pub config: Arc<Config>,
    /// Bearer token issuer and verifier
    pub tokens: TokenSigner,
    /// Article generator
    pub ai: AiWriter,
    /// Keyword intent matcher
    pub chatbot: Arc<Chatbot>,
    /// Progress of the telemetry generator
    pub telemetry: Arc<TelemetryMonitor>,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Seconds since the state was built
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
