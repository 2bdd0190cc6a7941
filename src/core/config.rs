//! Configuration management for Eco-Grid
//!
//! Settings come from three layers, applied in order: built-in defaults, an
//! optional TOML file, then `ECO_*` environment variables. CLI flags are applied
//! last by the binary.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Default config file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "eco-grid.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Token signing and bootstrap admin
    pub auth: AuthConfig,

    /// Synthetic telemetry generator
    pub telemetry: TelemetryConfig,

    /// LLM provider used by the AI writer
    pub ai: AiConfig,

    /// Chatbot storage limits
    pub chat: ChatConfig,

    /// Metrics and monitoring
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Insert demo articles, pilots and milestones on startup
    pub seed_demo_content: bool,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret used to derive the token MAC key; a random per-process key is
    /// used when unset
    pub token_secret: Option<String>,

    /// Lifetime of issued bearer tokens
    #[serde(with = "duration_str")]
    pub token_ttl: Duration,

    /// Email of the admin account created on first start
    pub admin_email: Option<String>,

    /// Password of the admin account created on first start
    pub admin_password: Option<String>,
}

/// Telemetry generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Run the generator at all
    pub enabled: bool,

    /// Time between two generator ticks
    #[serde(with = "duration_str")]
    pub interval: Duration,

    /// Rows kept per telemetry collection; status rows are counted per component
    pub retention: usize,

    /// Components reported in system status rows
    pub components: Vec<String>,

    /// Chance per tick of writing a security event (0.0 - 1.0)
    pub security_event_probability: f64,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of an OpenAI compatible API
    pub base_url: String,

    /// Model name sent with each completion request
    pub model: String,

    /// API key; generation is disabled without one
    pub api_key: Option<String>,

    /// Request timeout
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Sampling temperature
    pub temperature: f32,
}

/// Chatbot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Sessions kept in memory; the least recently active are dropped first
    pub max_sessions: usize,

    /// Messages kept per session; older turns are dropped
    pub max_messages: usize,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics on `/metrics`
    pub enable_prometheus: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            seed_demo_content: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl: Duration::from_secs(24 * 3600),
            admin_email: None,
            admin_password: None,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            retention: 1440,
            components: ["api", "grid", "devices", "database"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            security_event_probability: 0.1,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            temperature: 0.7,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            max_messages: 100,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `eco-grid.toml` (if present) and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply `ECO_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("ECO_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Some(secret) = lookup("ECO_TOKEN_SECRET") {
            self.auth.token_secret = Some(secret).filter(|s| !s.is_empty());
        }

        if let Some(email) = lookup("ECO_ADMIN_EMAIL") {
            self.auth.admin_email = Some(email);
        }

        if let Some(password) = lookup("ECO_ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }

        if let Some(key) = lookup("ECO_AI_API_KEY") {
            self.ai.api_key = Some(key).filter(|k| !k.is_empty());
        }

        if let Some(url) = lookup("ECO_AI_BASE_URL") {
            self.ai.base_url = url;
        }

        if let Some(model) = lookup("ECO_AI_MODEL") {
            self.ai.model = model;
        }

        if let Some(enabled) = lookup("ECO_TELEMETRY_ENABLED") {
            self.telemetry.enabled = enabled
                .parse()
                .map_err(|e| Error::config(format!("Invalid telemetry flag: {}", e)))?;
        }

        if let Some(interval) = lookup("ECO_TELEMETRY_INTERVAL") {
            self.telemetry.interval = parse_duration(&interval).map_err(Error::config)?;
        }

        if let Some(level) = lookup("ECO_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(Error::config(format!("Invalid log level: {}", other))),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => return Err(Error::config(format!("Invalid log format: {}", other))),
        }

        if let Some(secret) = &self.auth.token_secret {
            if secret.len() < 16 {
                return Err(Error::config("Token secret too short (minimum 16 bytes)"));
            }
        }

        if self.auth.token_ttl < Duration::from_secs(60) {
            return Err(Error::config("Token TTL too short (minimum 60s)"));
        }

        match (&self.auth.admin_email, &self.auth.admin_password) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::config(
                    "admin_email and admin_password must be set together",
                ))
            }
            (Some(_), Some(password)) if password.len() < 8 => {
                return Err(Error::config("Admin password too short (minimum 8 chars)"))
            }
            _ => {}
        }

        if self.telemetry.interval < Duration::from_secs(1) {
            return Err(Error::config("Telemetry interval too short (minimum 1s)"));
        }

        if self.telemetry.retention == 0 {
            return Err(Error::config("Telemetry retention must be at least 1"));
        }

        if !(0.0..=1.0).contains(&self.telemetry.security_event_probability) {
            return Err(Error::config(
                "security_event_probability must be between 0.0 and 1.0",
            ));
        }

        if self.chat.max_sessions == 0 {
            return Err(Error::config("chat.max_sessions must be at least 1"));
        }

        // One exchange is a visitor message plus the reply
        if self.chat.max_messages < 2 {
            return Err(Error::config("chat.max_messages must be at least 2"));
        }

        if self.ai.timeout.is_zero() {
            return Err(Error::config("AI timeout must be positive"));
        }

        Ok(())
    }
}

/// Serde adapter for durations written as `"30s"`, `"5m"`, `"250ms"`
mod duration_str {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", value.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", value.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration(&raw).map_err(de::Error::custom)
    }
}

/// Simple duration parser for common formats
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("Invalid duration: {}", s);

    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse().map(Duration::from_millis).map_err(|_| invalid())
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse().map(Duration::from_secs).map_err(|_| invalid())
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .map(|m| Duration::from_secs(m * 60))
            .map_err(|_| invalid())
    } else if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map(|h| Duration::from_secs(h * 3600))
            .map_err(|_| invalid())
    } else {
        // Raw seconds
        s.parse().map(Duration::from_secs).map_err(|_| invalid())
    }
}
