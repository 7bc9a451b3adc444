//! Coalescing configuration.
//!
//! Only the behavior stage reads this. Normalization and flattening behave
//! the same no matter what it says.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default length of a coalescing window, roughly one frame at 60 Hz.
pub const DEFAULT_WINDOW_MS: u64 = 16;

/// Settings for the coalescing behavior stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalescingConfig {
    /// Whether bursts of values are coalesced at all.
    pub optimized: bool,

    /// Quiet window, in milliseconds, a burst is collected over.
    pub window_ms: u64,
}

impl CoalescingConfig {
    /// Coalescing switched on with the default window.
    pub fn optimized() -> Self {
        Self {
            optimized: true,
            ..Self::default()
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for CoalescingConfig {
    fn default() -> Self {
        Self {
            optimized: false,
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_optimized() {
        let config = CoalescingConfig::default();
        assert!(!config.optimized);
        assert_eq!(config.window(), Duration::from_millis(DEFAULT_WINDOW_MS));
    }

    #[test]
    fn parses_partial_json() {
        let config = CoalescingConfig::from_json(r#"{ "optimized": true }"#).unwrap();
        assert_eq!(config, CoalescingConfig::optimized());

        let config = CoalescingConfig::from_json(r#"{ "window_ms": 50 }"#).unwrap();
        assert!(!config.optimized);
        assert_eq!(config.window_ms, 50);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(CoalescingConfig::from_json("{ optimized: yes }").is_err());
    }
}
