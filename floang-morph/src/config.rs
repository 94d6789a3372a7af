use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::debug::Thresholds;
use crate::error::ConfigError;
use crate::geometry::Vector2;
use crate::golden::Tolerance;
use crate::params::MorphParams;

/// Drawing surface the shapes are laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl CanvasConfig {
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.center_x, self.center_y)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 800.0,
            center_x: 400.0,
            center_y: 400.0,
            radius: 250.0,
        }
    }
}

/// Everything the lab reads at startup. Every field is optional in JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabConfig {
    pub canvas: CanvasConfig,
    pub params: MorphParams,
    pub thresholds: Thresholds,
    pub tolerance: Tolerance,
}

impl LabConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;

        tracing::info!(path = %path.display(), sides = config.params.sides, "loaded lab config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.canvas.radius.is_finite() && self.canvas.radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canvas radius must be positive, got {}",
                self.canvas.radius
            )));
        }

        self.params.validate()
    }
}
