use std::f64::consts::TAU;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::geometry::{self, Vector2};

/// A vertex of the outline. Handles are offsets from `position`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub position: Vector2,
    pub handle_in: Vector2,
    pub handle_out: Vector2,
}

impl AnchorPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            ..Self::default()
        }
    }

    pub fn at(position: Vector2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn handle_in_absolute(&self) -> Vector2 {
        self.position + self.handle_in
    }

    pub fn handle_out_absolute(&self) -> Vector2 {
        self.position + self.handle_out
    }
}

/// Control points of one cubic edge, in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p0: Vector2,
    pub cp1: Vector2,
    pub cp2: Vector2,
    pub p3: Vector2,
}

impl Segment {
    pub fn evaluate(&self, t: f64) -> Vector2 {
        geometry::evaluate_bezier(self.p0, self.cp1, self.cp2, self.p3, t)
    }

    pub fn tangent(&self, t: f64) -> geometry::Tangent {
        geometry::bezier_tangent(self.p0, self.cp1, self.cp2, self.p3, t)
    }
}

/// Closed outline. Anchor order defines traversal; indices wrap.
///
/// `center` is the fixed reference point that symmetry scoring and
/// center-distance metrics measure against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub anchors: Vec<AnchorPoint>,
    pub center: Vector2,
}

impl Shape {
    pub fn new(anchors: Vec<AnchorPoint>) -> Self {
        Self {
            anchors,
            center: CanvasConfig::default().center(),
        }
    }

    pub fn with_center(anchors: Vec<AnchorPoint>, center: Vector2) -> Self {
        Self { anchors, center }
    }

    /// `rotation` is in radians. Handles start at zero; see [`Shape::apply_params`].
    pub fn create_polygon(sides: usize, radius: f64, center_x: f64, center_y: f64, rotation: f64) -> Self {
        let center = Vector2::new(center_x, center_y);
        let anchors = (0..sides)
            .map(|i| AnchorPoint::at(regular_position(center, radius, rotation, sides, i)))
            .collect();

        Self { anchors, center }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Index of the anchor after `i`, wrapping.
    pub fn next_index(&self, i: usize) -> usize {
        (i + 1) % self.anchors.len()
    }

    /// Edge `i` runs from anchor `i` to anchor `i + 1 mod n`.
    pub fn edge_segment(&self, i: usize) -> Segment {
        let a = &self.anchors[i];
        let b = &self.anchors[self.next_index(i)];

        Segment {
            p0: a.position,
            cp1: a.handle_out_absolute(),
            cp2: b.handle_in_absolute(),
            p3: b.position,
        }
    }

    pub fn edge_length(&self, i: usize) -> f64 {
        let next = self.next_index(i);
        geometry::distance(self.anchors[i].position, self.anchors[next].position)
    }

    /// Recompute every handle from the apex construction. A pure function of
    /// the current anchor positions.
    pub fn apply_params(&mut self, flow_factor: f64, angle_degrees: f64) {
        let n = self.anchors.len();

        for i in 0..n {
            let next = (i + 1) % n;
            let handles = geometry::edge_handles(
                self.anchors[i].position,
                self.anchors[next].position,
                angle_degrees,
                flow_factor,
            );

            self.anchors[i].handle_out = handles.handle_out;
            self.anchors[next].handle_in = handles.handle_in;
        }
    }

    /// Edge-length variance + center-distance variance + 0.1 × pooled
    /// handle-magnitude variance. Zero for a regular shape, unbounded above.
    pub fn calculate_symmetry(&self) -> f64 {
        let n = self.anchors.len();

        if n < 3 {
            return 0.0;
        }

        let edge_lengths: Vec<f64> = (0..n).map(|i| self.edge_length(i)).collect();

        let center_distances: Vec<f64> = self
            .anchors
            .iter()
            .map(|a| geometry::distance(a.position, self.center))
            .collect();

        let handle_magnitudes: Vec<f64> = self
            .anchors
            .iter()
            .flat_map(|a| [a.handle_in.magnitude(), a.handle_out.magnitude()])
            .collect();

        geometry::variance(&edge_lengths)
            + geometry::variance(&center_distances)
            + 0.1 * geometry::variance(&handle_magnitudes)
    }

    /// SVG path data for the closed outline: `M x y C ... Z`.
    pub fn svg_path_data(&self) -> String {
        let Some(first) = self.anchors.first() else {
            return String::new();
        };

        let mut path = format!("M {} {}", first.position.x, first.position.y);

        for i in 0..self.anchors.len() {
            let seg = self.edge_segment(i);
            let _ = write!(
                path,
                " C {} {}, {} {}, {} {}",
                seg.cp1.x, seg.cp1.y, seg.cp2.x, seg.cp2.y, seg.p3.x, seg.p3.y
            );
        }

        path.push_str(" Z");
        path
    }
}

/// Position of anchor `i` on a regular `sides`-gon.
pub fn regular_position(center: Vector2, radius: f64, rotation: f64, sides: usize, i: usize) -> Vector2 {
    let step = TAU / sides as f64;
    let angle = rotation + i as f64 * step;

    Vector2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}
