use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::error::ConfigError;
use crate::shape::Shape;

/// Shape and timing controls for one morph. Also the snapshot of "what the
/// user had dialed in" stored next to captured frames and golden states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MorphParams {
    pub sides: usize,
    pub flow_factor: f64,
    /// Apex angle in degrees for shapes at rest.
    pub handle_angle: f64,
    /// Radians.
    pub rotation: f64,
    /// Milliseconds.
    pub duration: f64,
    pub easing_power: f64,
    /// Where on the closing segment the new anchor is born, `[0, 1]`.
    pub insertion_position: f64,
    pub emergence_speed: f64,
    pub symmetry_weight: f64,
}

impl MorphParams {
    /// The lab's starting state: an inverted-flow triangle.
    pub const STANDARD: Self = Self {
        sides: 3,
        flow_factor: -0.66,
        handle_angle: 60.0,
        rotation: 0.0,
        duration: 3000.0,
        easing_power: 3.0,
        insertion_position: 0.5,
        emergence_speed: 1.0,
        symmetry_weight: 1.0,
    };

    /// Long, soft quadratic ease. The new anchor drifts out slowly.
    pub const GENTLE: Self = Self {
        duration: 5000.0,
        easing_power: 2.0,
        emergence_speed: 0.6,
        symmetry_weight: 0.8,
        ..Self::STANDARD
    };

    /// Short, steep ease. Good for spotting frame-to-frame jumps.
    pub const SNAPPY: Self = Self {
        duration: 800.0,
        easing_power: 4.0,
        ..Self::STANDARD
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sides < 3 {
            return Err(ConfigError::Invalid(format!("sides must be >= 3, got {}", self.sides)));
        }

        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ConfigError::Invalid(format!("duration must be positive, got {}", self.duration)));
        }

        if !(self.easing_power.is_finite() && self.easing_power > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "easingPower must be positive, got {}",
                self.easing_power
            )));
        }

        if !(0.0..=1.0).contains(&self.insertion_position) {
            return Err(ConfigError::Invalid(format!(
                "insertionPosition must be within [0, 1], got {}",
                self.insertion_position
            )));
        }

        Ok(())
    }

    /// Regular `sides`-gon on the canvas with handles applied.
    pub fn rest_shape(&self, canvas: &CanvasConfig) -> Shape {
        self.shape_with_sides(self.sides, canvas)
    }

    /// Regular `sides + 1`-gon: what a morph from [`MorphParams::rest_shape`] converges to.
    pub fn target_shape(&self, canvas: &CanvasConfig) -> Shape {
        self.shape_with_sides(self.sides + 1, canvas)
    }

    fn shape_with_sides(&self, sides: usize, canvas: &CanvasConfig) -> Shape {
        let mut shape = Shape::create_polygon(sides, canvas.radius, canvas.center_x, canvas.center_y, self.rotation);
        shape.apply_params(self.flow_factor, self.handle_angle);
        shape
    }
}

impl Default for MorphParams {
    fn default() -> Self {
        Self::STANDARD
    }
}
