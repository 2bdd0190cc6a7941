//! Builds [`AppState`] from configuration

use std::sync::Arc;
use std::time::Instant;

use crate::core::app_state::AppState;
use crate::core::config::Config;
use crate::core::Result;
use crate::security::TokenSigner;
use crate::services::{self, AiWriter, Chatbot, CompletionClient, OpenAiClient, TelemetryGenerator, TelemetryMonitor};
use crate::storage::Store;

/// Build the application state with the configured OpenAI-compatible client
pub fn create_app_state(config: Config) -> Result<AppState> {
    let client = OpenAiClient::from_config(&config.ai)?;
    create_app_state_with_client(config, Arc::new(client))
}

/// Build the application state around an arbitrary completion backend
///
/// Creates the bootstrap admin when credentials are configured and seeds demo
/// content when enabled.
pub fn create_app_state_with_client(config: Config, client: Arc<dyn CompletionClient>) -> Result<AppState> {
    let store = Store::shared();

    if let (Some(email), Some(password)) = (&config.auth.admin_email, &config.auth.admin_password) {
        services::users::ensure_admin(&store, email, password)?;
    }

    if config.server.seed_demo_content {
        services::seed::seed_demo_content(&store)?;
    }

    let tokens = match &config.auth.token_secret {
        Some(secret) => TokenSigner::new(secret, config.auth.token_ttl),
        None => {
            tracing::warn!("no token secret configured; using a random key, tokens will not survive a restart");
            TokenSigner::ephemeral(config.auth.token_ttl)
        }
    };

    let chatbot = Arc::new(Chatbot::default().with_limits(config.chat.clone()));

    tracing::debug!(collections = store.stats().collections.len(), "application state created");

    Ok(AppState {
        store,
        config: Arc::new(config),
        tokens,
        ai: AiWriter::new(client),
        chatbot,
        telemetry: Arc::new(TelemetryMonitor::default()),
        started_at: Instant::now(),
    })
}

/// Telemetry generator bound to the state's store and monitor, or `None` when disabled
pub fn create_telemetry_generator(state: &AppState) -> Option<TelemetryGenerator> {
    let config = &state.config.telemetry;
    if !config.enabled {
        return None;
    }
    Some(TelemetryGenerator::new(
        state.store.clone(),
        config.clone(),
        state.telemetry.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn config() -> Config {
        let mut config = Config::default();
        config.auth.token_secret = Some("factory-test-secret-value".into());
        config
    }

    #[test]
    fn test_bare_state_is_empty() {
        let state = create_app_state(config()).unwrap();
        assert_eq!(state.store.stats().total, 0);
        assert_eq!(state.telemetry.ticks(), 0);
    }

    #[test]
    fn test_admin_bootstrap_and_seed() {
        let mut config = config();
        config.auth.admin_email = Some("Admin@Eco-Grid.io".into());
        config.auth.admin_password = Some("correct horse battery".into());
        config.server.seed_demo_content = true;

        let state = create_app_state(config).unwrap();
        let admin = state
            .store
            .users
            .find_one(|u| u.email == "admin@eco-grid.io")
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(!state.store.articles.is_empty());
        assert!(!state.store.milestones.is_empty());
    }

    #[test]
    fn test_unset_secret_rejects_well_known_keys() {
        let mut config = Config::default();
        config.auth.admin_email = Some("admin@eco-grid.io".into());
        config.auth.admin_password = Some("correct horse battery".into());
        let state = create_app_state(config).unwrap();

        let admin = state.store.users.find_one(|u| u.role == Role::Admin).unwrap();
        let ttl = std::time::Duration::from_secs(3600);
        for secret in ["eco-grid-development-secret", ""] {
            let forged = TokenSigner::new(secret, ttl).issue(&admin).unwrap();
            assert!(state.tokens.verify(&forged.token).is_err(), "{secret:?} accepted");
        }

        let issued = state.tokens.issue(&admin).unwrap();
        assert_eq!(state.tokens.verify(&issued.token).unwrap().sub, admin.id);
    }

    #[test]
    fn test_telemetry_generator_follows_config() {
        let mut config = config();
        config.telemetry.enabled = false;
        let state = create_app_state(config).unwrap();
        assert!(create_telemetry_generator(&state).is_none());

        let mut config = self::config();
        config.telemetry.enabled = true;
        let state = create_app_state(config).unwrap();
        assert!(create_telemetry_generator(&state).is_some());
    }
}
