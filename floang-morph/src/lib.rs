//! Curved regular polygons that morph from n to n+1 sides without visual
//! discontinuity, plus the frame debugger and golden snapshots used to
//! keep the transition free of glitches.

pub mod comparison;
pub mod config;
pub mod debug;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod golden;
pub mod interpolate;
pub mod metrics;
pub mod morph;
pub mod params;
pub mod shape;
pub mod snapshot;

pub use comparison::MorphComparison;
pub use config::{CanvasConfig, LabConfig};
pub use debug::{Anomaly, AnomalyKind, Debugger, Frame, Thresholds};
pub use error::{ConfigError, MorphError, SnapshotError};
pub use geometry::Vector2;
pub use golden::{GoldenDiff, GoldenRegistry, GoldenSnapshot, Tolerance};
pub use morph::MorphAnimation;
pub use params::MorphParams;
pub use shape::{AnchorPoint, Shape};
