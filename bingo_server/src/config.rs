//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use care_bingo::session::SessionConfig;
use std::net::{Ipv4Addr, SocketAddr};

/// Default HTTP bind address
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 6969);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter bind address; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Seed demo sessions and cards on startup
    pub seed_demo: bool,
    /// Session actor configuration
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            metrics_bind: None,
            seed_demo: false,
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_override` - Optional metrics bind address override (from CLI args)
    /// * `demo_override` - Force demo seeding on (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_override: Option<SocketAddr>,
        demo_override: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let metrics_bind = match metrics_override {
            Some(addr) => Some(addr),
            None => parse_env("METRICS_BIND")?,
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            claim_window_minutes: parse_env_or("CLAIM_WINDOW_MINUTES", defaults.claim_window_minutes)?,
            auto_activate: parse_env_or("AUTO_ACTIVATE", defaults.auto_activate)?,
            tick_interval_ms: parse_env_or("SESSION_TICK_MS", defaults.tick_interval_ms)?,
            inbox_capacity: parse_env_or("SESSION_INBOX_CAPACITY", defaults.inbox_capacity)?,
            subscriber_buffer: parse_env_or("SUBSCRIBER_BUFFER", defaults.subscriber_buffer)?,
        };

        let seed_demo = demo_override || parse_env_or("SEED_DEMO", false)?;

        Ok(ServerConfig {
            bind,
            metrics_bind,
            seed_demo,
            session,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero_checks = [
            ("CLAIM_WINDOW_MINUTES", self.session.claim_window_minutes == 0),
            ("SESSION_TICK_MS", self.session.tick_interval_ms == 0),
            ("SESSION_INBOX_CAPACITY", self.session.inbox_capacity == 0),
            ("SUBSCRIBER_BUFFER", self.session.subscriber_buffer == 0),
        ];

        for (var, is_zero) in zero_checks {
            if is_zero {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        if let Some(metrics) = self.metrics_bind
            && metrics == self.bind
        {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional environment variable, rejecting values that do not parse
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_env(key)?.unwrap_or(default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{raw}': {e}"),
    })
}
