//! Application configuration

use serde::{Deserialize, Serialize};

use spatial_engine::config::{Config, ConfigError, InteractionConfig, SessionConfig};
use spatial_engine::foundation::logging;

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default log filter; `RUST_LOG` overrides it
    pub log_filter: String,
    /// Cube and fingertip parameters
    pub interaction: InteractionConfig,
    /// Sensing session parameters
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: logging::DEFAULT_FILTER.to_string(),
            interaction: InteractionConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config for AppConfig {}

impl AppConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_filter",
                reason: "must not be empty".to_string(),
            });
        }
        self.interaction.validate()?;
        self.session.validate()
    }
}
