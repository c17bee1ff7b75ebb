//! Configuration loading for the visualizer.
//!
//! Fallback attribute values are loaded from a TOML file. Every field is
//! optional; a missing field keeps its built-in default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use scene_data::{Cartesian2, Cartesian3, Color, HeightReference, HorizontalOrigin, VerticalOrigin};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Complete visualizer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualizerConfig {
    /// Values written when an entity leaves an attribute unset
    #[serde(default)]
    pub defaults: BillboardDefaults,
}

impl VisualizerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Fallback billboard attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillboardDefaults {
    pub color: Color,
    pub eye_offset: Cartesian3,
    pub height_reference: HeightReference,
    pub pixel_offset: Cartesian2,
    pub scale: f64,
    /// Radians, counter-clockwise
    pub rotation: f64,
    pub aligned_axis: Cartesian3,
    pub horizontal_origin: HorizontalOrigin,
    pub vertical_origin: VerticalOrigin,
    pub size_in_meters: bool,
}

impl Default for BillboardDefaults {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            eye_offset: Cartesian3::ZERO,
            height_reference: HeightReference::None,
            pixel_offset: Cartesian2::ZERO,
            scale: 1.0,
            rotation: 0.0,
            aligned_axis: Cartesian3::ZERO,
            horizontal_origin: HorizontalOrigin::Center,
            vertical_origin: VerticalOrigin::Center,
            size_in_meters: false,
        }
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Billboard visualizer configuration

[defaults]
height_reference = "none"
scale = 1.0
rotation = 0.0
horizontal_origin = "center"
vertical_origin = "center"
size_in_meters = false

[defaults.color]
red = 1.0
green = 1.0
blue = 1.0
alpha = 1.0

[defaults.eye_offset]
x = 0.0
y = 0.0
z = 0.0

[defaults.pixel_offset]
x = 0.0
y = 0.0

[defaults.aligned_axis]
x = 0.0
y = 0.0
z = 0.0
"#
    .to_string()
}
