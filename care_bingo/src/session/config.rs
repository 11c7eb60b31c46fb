//! Session runtime configuration.

use serde::{Deserialize, Serialize};

/// Tunables shared by every session actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minutes after a session ends during which win claims are accepted (default: 30)
    pub claim_window_minutes: u32,

    /// Activate scheduled sessions automatically once their start time passes
    pub auto_activate: bool,

    /// How often each actor checks its schedule, in milliseconds
    pub tick_interval_ms: u64,

    /// Actor inbox capacity
    pub inbox_capacity: usize,

    /// Events buffered per subscriber before further events are dropped
    pub subscriber_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            claim_window_minutes: 30,
            auto_activate: true,
            tick_interval_ms: 1_000,
            inbox_capacity: 100,
            subscriber_buffer: 32,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.claim_window_minutes == 0 {
            return Err("Claim window must be at least one minute".to_string());
        }

        if self.tick_interval_ms == 0 {
            return Err("Tick interval must be greater than zero".to_string());
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be greater than zero".to_string());
        }

        // The join snapshot is sent into the subscriber buffer, so it needs room.
        if self.subscriber_buffer == 0 {
            return Err("Subscriber buffer must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn claim_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.claim_window_minutes))
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.claim_window(), chrono::Duration::minutes(30));
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = SessionConfig {
            claim_window_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            subscriber_buffer: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"auto_activate":false}"#).unwrap();
        assert!(!config.auto_activate);
        assert_eq!(config.claim_window_minutes, 30);
    }
}
