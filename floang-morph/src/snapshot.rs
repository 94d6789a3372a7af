use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::CanvasConfig;
use crate::geometry::Vector2;
use crate::shape::{AnchorPoint, Shape};

/// Frozen copy of a shape as stored in frames and golden snapshots.
/// Shares nothing with the live shape it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSnapshot {
    pub anchors: Vec<AnchorSnapshot>,
    #[serde(default = "default_center")]
    pub center: Vector2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSnapshot {
    pub pos: Vector2,
    pub handle_in: Vector2,
    pub handle_out: Vector2,
}

fn default_center() -> Vector2 {
    CanvasConfig::default().center()
}

/// RFC 3339 wall-clock time for `capturedAt` / `exportedAt` fields.
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

impl ShapeSnapshot {
    pub fn capture(shape: &Shape) -> Self {
        Self {
            anchors: shape
                .anchors
                .iter()
                .map(|a| AnchorSnapshot {
                    pos: a.position,
                    handle_in: a.handle_in,
                    handle_out: a.handle_out,
                })
                .collect(),
            center: shape.center,
        }
    }

    /// Fresh, independent shape rebuilt from the snapshot.
    pub fn to_shape(&self) -> Shape {
        let anchors = self
            .anchors
            .iter()
            .map(|a| AnchorPoint {
                position: a.pos,
                handle_in: a.handle_in,
                handle_out: a.handle_out,
            })
            .collect();

        Shape::with_center(anchors, self.center)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl From<&Shape> for ShapeSnapshot {
    fn from(shape: &Shape) -> Self {
        Self::capture(shape)
    }
}
