//! Before / just-after / finished states of one morph, rendered side by side
//! as SVG. Insertion glitches show up as a kink in the middle panel.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::metrics;
use crate::params::MorphParams;
use crate::shape::Shape;

/// Progress window in which the just-after state is taken.
const JUST_AFTER_WINDOW: (f64, f64) = (0.01, 0.03);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub label: String,
    pub progress: f64,
    pub path_data: String,
    pub anchors: usize,
    pub symmetry: f64,
    pub edge_angles: Vec<f64>,
    pub flow_factor: f64,
    pub handle_angle: f64,
}

impl StateSnapshot {
    /// `None` for shapes with fewer than two anchors.
    pub fn capture(shape: &Shape, label: &str, params: &MorphParams, progress: f64) -> Option<Self> {
        if shape.len() < 2 {
            return None;
        }

        Some(Self {
            label: label.to_string(),
            progress,
            path_data: shape.svg_path_data(),
            anchors: shape.len(),
            symmetry: shape.calculate_symmetry(),
            edge_angles: (0..shape.len()).map(|i| metrics::edge_angle(shape, i)).collect(),
            flow_factor: params.flow_factor,
            handle_angle: params.handle_angle,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorphComparison {
    pub before: Option<StateSnapshot>,
    pub just_after: Option<StateSnapshot>,
    pub finished: Option<StateSnapshot>,
}

impl MorphComparison {
    /// Record the starting shape and forget the previous morph's states.
    pub fn begin(&mut self, shape: &Shape, params: &MorphParams) {
        self.before = StateSnapshot::capture(shape, "BEFORE", params, 0.0);
        self.just_after = None;
        self.finished = None;
    }

    /// Feed every morph frame. Returns `true` once the finished state is
    /// taken, which happens exactly once per morph.
    pub fn observe(&mut self, shape: &Shape, params: &MorphParams, progress: f64) -> bool {
        let (lo, hi) = JUST_AFTER_WINDOW;

        if self.just_after.is_none() && progress > lo && progress < hi {
            self.just_after = StateSnapshot::capture(shape, "JUST AFTER START", params, progress);
            tracing::debug!(progress, "captured just-after state");
        }

        if self.finished.is_none() && progress >= 1.0 {
            self.finished = StateSnapshot::capture(shape, "FINISHED", params, progress);
            tracing::debug!("captured finished state");
            return true;
        }

        false
    }

    pub fn is_complete(&self) -> bool {
        self.before.is_some() && self.just_after.is_some() && self.finished.is_some()
    }

    /// Three panels on a 1400×900 sheet. Missing states leave an empty panel.
    pub fn to_svg(&self) -> String {
        let mut svg = String::from(
            "<svg width=\"1400\" height=\"900\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 1400 900\">\n  \
             <rect width=\"1400\" height=\"900\" fill=\"#0a0a0a\"/>\n",
        );

        let panels = [
            (&self.before, "BEFORE", -200, "rgba(135,206,235,0.3)", "#4682b4"),
            (&self.just_after, "JUST AFTER START", 200, "rgba(255,165,0,0.3)", "#ff8c00"),
            (&self.finished, "FINISHED", 600, "rgba(0,255,0,0.3)", "#00ff00"),
        ];

        for (state, title, dx, fill, stroke) in panels {
            write_panel(&mut svg, state.as_ref(), title, dx, fill, stroke);
        }

        svg.push_str("</svg>\n");
        svg
    }

    pub fn write_svg(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        fs::write(path, self.to_svg())?;
        tracing::info!(path = %path.display(), complete = self.is_complete(), "wrote morph comparison");
        Ok(())
    }
}

fn write_panel(svg: &mut String, state: Option<&StateSnapshot>, title: &str, dx: i32, fill: &str, stroke: &str) {
    let path = state.map_or("", |s| s.path_data.as_str());
    let anchors = state.map_or(0, |s| s.anchors);
    let symmetry = state.map_or(0.0, |s| s.symmetry);
    let (flow, angle) = state.map_or((0.0, 0.0), |s| (s.flow_factor, s.handle_angle));
    let edges = state.map_or(String::new(), |s| {
        s.edge_angles.iter().map(|a| format!("{a:.2}")).collect::<Vec<_>>().join(", ")
    });

    let _ = write!(
        svg,
        "  <g transform=\"translate({dx}, 50)\">\n    \
         <path d=\"{path}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"2\"/>\n    \
         <text x=\"400\" y=\"50\" fill=\"#fff\" text-anchor=\"middle\" font-size=\"14\" font-weight=\"bold\">{title}</text>\n    \
         <text x=\"400\" y=\"70\" fill=\"#aaa\" text-anchor=\"middle\" font-size=\"10\">Anchors: {anchors}</text>\n    \
         <text x=\"400\" y=\"85\" fill=\"#aaa\" text-anchor=\"middle\" font-size=\"10\">Symmetry: {symmetry:.4}</text>\n    \
         <text x=\"400\" y=\"100\" fill=\"#aaa\" text-anchor=\"middle\" font-size=\"10\">Flow: {flow:.2}, Angle: {angle:.0}°</text>\n    \
         <text x=\"400\" y=\"115\" fill=\"#aaa\" text-anchor=\"middle\" font-size=\"10\">Edges: {edges}</text>\n  \
         </g>\n"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use crate::morph::MorphAnimation;

    fn run(params: MorphParams, steps: usize) -> MorphComparison {
        let canvas = CanvasConfig::default();
        let from = params.rest_shape(&canvas);
        let mut morph = MorphAnimation::new();
        morph.start(&from, params.target_shape(&canvas), params, 0.0).expect("valid morph");

        let mut comparison = MorphComparison::default();
        comparison.begin(&from, &params);

        for i in 0..=steps {
            if let Some(shape) = morph.update(params.duration * i as f64 / steps as f64) {
                comparison.observe(&shape, &params, morph.progress());
            }
        }

        comparison
    }

    #[test]
    fn full_morph_fills_all_three_states() {
        let comparison = run(MorphParams::default(), 200);

        assert!(comparison.is_complete());
        assert_eq!(comparison.before.as_ref().map(|s| s.anchors), Some(3));

        let just_after = comparison.just_after.as_ref().expect("in window");
        assert_eq!(just_after.anchors, 4);
        assert!(just_after.progress > 0.01 && just_after.progress < 0.03);

        let finished = comparison.finished.as_ref().expect("complete");
        assert_eq!(finished.anchors, 4);
        assert_eq!(finished.edge_angles.len(), 4);
        assert!(finished.symmetry < 1e-6);
    }

    #[test]
    fn finished_reported_once() {
        let params = MorphParams::default();
        let shape = params.rest_shape(&CanvasConfig::default());
        let mut comparison = MorphComparison::default();

        assert!(!comparison.observe(&shape, &params, 0.5));
        assert!(comparison.observe(&shape, &params, 1.0));
        assert!(!comparison.observe(&shape, &params, 1.0));
    }

    #[test]
    fn coarse_steps_can_miss_the_window() {
        let comparison = run(MorphParams::default(), 10);

        assert!(comparison.just_after.is_none());
        assert!(comparison.finished.is_some());
        assert!(!comparison.is_complete());
    }

    #[test]
    fn begin_clears_previous_morph() {
        let mut comparison = run(MorphParams::default(), 200);
        let square = MorphParams::default().target_shape(&CanvasConfig::default());
        comparison.begin(&square, &MorphParams::default());

        assert_eq!(comparison.before.as_ref().map(|s| s.anchors), Some(4));
        assert!(comparison.just_after.is_none());
        assert!(comparison.finished.is_none());
    }

    #[test]
    fn tiny_shapes_are_not_captured() {
        let dot = Shape::new(vec![crate::shape::AnchorPoint::new(1.0, 1.0)]);
        assert!(StateSnapshot::capture(&dot, "X", &MorphParams::default(), 0.0).is_none());
    }

    #[test]
    fn svg_holds_three_panels_with_paths() {
        let comparison = run(MorphParams::default(), 200);
        let svg = comparison.to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path d=\"M ").count(), 3);
        assert!(svg.contains("JUST AFTER START"));
        assert!(svg.contains("translate(-200, 50)"));
        assert!(svg.contains(&comparison.finished.expect("complete").path_data));
    }

    #[test]
    fn empty_panels_still_render() {
        let svg = MorphComparison::default().to_svg();

        assert_eq!(svg.matches("<path d=\"\"").count(), 3);
        assert!(svg.contains("Anchors: 0"));
    }

    #[test]
    fn write_to_missing_directory_fails_cleanly() {
        let result = MorphComparison::default().write_svg("/nonexistent-dir/floang/snapshots.svg");
        assert!(matches!(result, Err(SnapshotError::Io(_))));
    }
}
