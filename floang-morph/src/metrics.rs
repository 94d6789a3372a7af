use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::shape::Shape;

/// Per-shape measurements shared by the anomaly detector and the golden
/// registry. Always derived, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub anchor_count: usize,
    pub symmetry: f64,
    pub edge_angles: Vec<f64>,
    pub handle_magnitudes: Vec<HandleMagnitude>,
    pub center_distances: Vec<f64>,
    pub edge_lengths: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleMagnitude {
    #[serde(rename = "in")]
    pub handle_in: f64,
    #[serde(rename = "out")]
    pub handle_out: f64,
}

impl Metrics {
    pub fn of(shape: &Shape) -> Self {
        let n = shape.len();

        Self {
            anchor_count: n,
            symmetry: shape.calculate_symmetry(),
            edge_angles: (0..n).map(|i| edge_angle(shape, i)).collect(),
            handle_magnitudes: shape
                .anchors
                .iter()
                .map(|a| HandleMagnitude {
                    handle_in: a.handle_in.magnitude(),
                    handle_out: a.handle_out.magnitude(),
                })
                .collect(),
            center_distances: shape
                .anchors
                .iter()
                .map(|a| geometry::distance(a.position, shape.center))
                .collect(),
            edge_lengths: (0..n).map(|i| shape.edge_length(i)).collect(),
        }
    }
}

/// Degrees. Derived from how far edge `i`'s outgoing control point stands
/// off the edge's chord. Zero for a collapsed edge.
pub fn edge_angle(shape: &Shape, i: usize) -> f64 {
    let seg = shape.edge_segment(i);
    let chord = seg.p3 - seg.p0;
    let base_length = chord.magnitude();

    if base_length == 0.0 {
        return 0.0;
    }

    let handle = seg.cp1 - seg.p0;
    let height = (handle.y * chord.x - handle.x * chord.y).abs() / base_length;

    (2.0 * height / (base_length / 2.0)).atan().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;
    use crate::shape::AnchorPoint;

    fn regular(sides: usize) -> Shape {
        let mut shape = Shape::create_polygon(sides, 250.0, 400.0, 400.0, 0.0);
        shape.apply_params(-0.66, 60.0);
        shape
    }

    #[test]
    fn lengths_match_anchor_count() {
        let m = Metrics::of(&regular(5));

        assert_eq!(m.anchor_count, 5);
        assert_eq!(m.edge_angles.len(), 5);
        assert_eq!(m.handle_magnitudes.len(), 5);
        assert_eq!(m.center_distances.len(), 5);
        assert_eq!(m.edge_lengths.len(), 5);
    }

    #[test]
    fn regular_shape_has_uniform_metrics() {
        let m = Metrics::of(&regular(6));

        for w in m.edge_angles.windows(2) {
            assert!((w[0] - w[1]).abs() < 1e-9);
        }

        for d in &m.center_distances {
            assert!((d - 250.0).abs() < 1e-9);
        }

        assert!(m.symmetry < 1e-9);
    }

    #[test]
    fn flat_handle_has_zero_angle() {
        let mut a = AnchorPoint::new(0.0, 0.0);
        a.handle_out = Vector2::new(3.0, 0.0);
        let b = AnchorPoint::new(10.0, 0.0);
        let shape = Shape::new(vec![a, b]);

        assert!(edge_angle(&shape, 0).abs() < 1e-12);
    }

    #[test]
    fn angle_grows_with_handle_height() {
        let b = AnchorPoint::new(10.0, 0.0);
        let mut low = AnchorPoint::new(0.0, 0.0);
        low.handle_out = Vector2::new(2.0, 1.0);
        let mut high = low;
        high.handle_out = Vector2::new(2.0, 4.0);

        let low_angle = edge_angle(&Shape::new(vec![low, b]), 0);
        let high_angle = edge_angle(&Shape::new(vec![high, b]), 0);
        assert!(high_angle > low_angle);

        // height 1 on a base of 10: atan(2 / 5)
        assert!((low_angle - (0.4f64).atan().to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn collapsed_edge_angle_is_zero() {
        let p = AnchorPoint::new(5.0, 5.0);
        let shape = Shape::new(vec![p, p, AnchorPoint::new(9.0, 9.0)]);

        assert_eq!(edge_angle(&shape, 0), 0.0);
    }

    #[test]
    fn handle_magnitudes_serialize_as_in_out() {
        let json = serde_json::to_value(Metrics::of(&regular(3))).expect("serializable");

        assert!(json["handleMagnitudes"][0].get("in").is_some());
        assert!(json["handleMagnitudes"][0].get("out").is_some());
        assert_eq!(json["anchorCount"], 3);
    }
}
