//! Configuration system
//!
//! File-backed configuration shared by the engine and applications built on
//! it. Files are TOML or RON, chosen by extension.

pub use serde::{Serialize, Deserialize};

use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension_of(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension_of(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its valid range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// # Interaction Configuration
///
/// Sizes and physics parameters for the nodes the user interacts with:
/// tap-spawned cubes and the invisible fingertip colliders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Edge length of spawned cubes (meters)
    pub cube_size: f32,
    /// Height above the tap point at which cubes appear (meters)
    pub spawn_height_offset: f32,
    /// Mass of spawned cubes (kilograms)
    pub cube_mass: f32,
    /// Friction coefficient of spawned cubes
    pub friction: f32,
    /// Restitution (bounciness) of spawned cubes
    pub restitution: f32,
    /// Radius of the fingertip marker spheres (meters)
    pub fingertip_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            cube_size: 0.1,
            spawn_height_offset: 0.2,
            cube_mass: 1.0,
            friction: 0.8,
            restitution: 0.0,
            fingertip_radius: 0.005,
        }
    }
}

impl InteractionConfig {
    /// Validate ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("interaction.cube_size", self.cube_size)?;
        positive("interaction.cube_mass", self.cube_mass)?;
        positive("interaction.fingertip_radius", self.fingertip_radius)?;
        unit_interval("interaction.restitution", self.restitution)?;
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(ConfigError::Invalid {
                field: "interaction.friction",
                reason: format!("must be a non-negative number, got {}", self.friction),
            });
        }
        if !self.spawn_height_offset.is_finite() {
            return Err(ConfigError::Invalid {
                field: "interaction.spawn_height_offset",
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// # Session Configuration
///
/// Channel sizing and replay pacing for sensing sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity of each anchor/event channel
    pub channel_capacity: usize,
    /// Delay between replayed steps of a scripted session (milliseconds)
    pub step_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            step_delay_ms: 0,
        }
    }
}

impl SessionConfig {
    /// Validate ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "session.channel_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("must be positive, got {value}") })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("must be within [0, 1], got {value}") })
    }
}
