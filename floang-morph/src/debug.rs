//! Frame capture, abrupt-change detection and playback over captured frames.
//!
//! Frames are appended in timestamp order while capturing and never touched
//! again. Detection compares each frame only with the one captured right
//! before it. Any breach pauses the session until [`Debugger::resume`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::geometry;
use crate::metrics::Metrics;
use crate::params::MorphParams;
use crate::shape::Shape;
use crate::snapshot::{self, ShapeSnapshot};

/// Largest per-frame change tolerated before a frame is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    /// Degrees.
    pub handle_angle_delta: f64,
    pub symmetry_spike: f64,
    pub handle_jump: f64,
    pub position_jump: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            handle_angle_delta: 5.0,
            symmetry_spike: 100.0,
            handle_jump: 10.0,
            position_jump: 5.0,
        }
    }
}

/// Partial threshold update; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdOverrides {
    pub handle_angle_delta: Option<f64>,
    pub symmetry_spike: Option<f64>,
    pub handle_jump: Option<f64>,
    pub position_jump: Option<f64>,
}

impl Thresholds {
    pub fn merged(self, overrides: ThresholdOverrides) -> Self {
        Self {
            handle_angle_delta: overrides.handle_angle_delta.unwrap_or(self.handle_angle_delta),
            symmetry_spike: overrides.symmetry_spike.unwrap_or(self.symmetry_spike),
            handle_jump: overrides.handle_jump.unwrap_or(self.handle_jump),
            position_jump: overrides.position_jump.unwrap_or(self.position_jump),
        }
    }
}

impl From<Thresholds> for ThresholdOverrides {
    fn from(t: Thresholds) -> Self {
        Self {
            handle_angle_delta: Some(t.handle_angle_delta),
            symmetry_spike: Some(t.symmetry_spike),
            handle_jump: Some(t.handle_jump),
            position_jump: Some(t.position_jump),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    SymmetrySpike,
    HandleAngleJump,
    HandlePositionJump,
    PositionJump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_index: Option<usize>,
    #[serde(default, rename = "handleType", skip_serializing_if = "Option::is_none")]
    pub handle: Option<HandleSide>,
    pub delta: f64,
    pub threshold: f64,
    pub message: String,
    /// Set once the anomaly is recorded against a captured frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_index: Option<usize>,
}

impl Anomaly {
    fn new(kind: AnomalyKind, severity: Severity, delta: f64, threshold: f64, message: String) -> Self {
        Self {
            kind,
            severity,
            edge_index: None,
            anchor_index: None,
            handle: None,
            delta,
            threshold,
            message,
            frame_index: None,
        }
    }
}

/// One captured step of a morph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub index: usize,
    pub timestamp: f64,
    pub progress: f64,
    pub shape: ShapeSnapshot,
    pub params: MorphParams,
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<Anomaly>,
}

impl Frame {
    pub fn new(index: usize, shape: &Shape, params: MorphParams, progress: f64, timestamp: f64) -> Self {
        Self {
            index,
            timestamp,
            progress,
            shape: ShapeSnapshot::capture(shape),
            params,
            metrics: Metrics::of(shape),
            anomalies: Vec::new(),
        }
    }

    /// Rebuild a standalone shape for display or re-analysis.
    pub fn to_shape(&self) -> Shape {
        self.shape.to_shape()
    }
}

/// Everything that changed beyond `thresholds` between two consecutive frames.
pub fn detect_anomalies(current: &Frame, previous: &Frame, thresholds: &Thresholds) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let curr = &current.metrics;
    let prev = &previous.metrics;

    let symmetry_delta = (curr.symmetry - prev.symmetry).abs();

    if symmetry_delta > thresholds.symmetry_spike {
        anomalies.push(Anomaly::new(
            AnomalyKind::SymmetrySpike,
            Severity::High,
            symmetry_delta,
            thresholds.symmetry_spike,
            format!(
                "Symmetry spiked by {symmetry_delta:.2} (threshold: {})",
                thresholds.symmetry_spike
            ),
        ));
    }

    if curr.edge_angles.len() == prev.edge_angles.len() {
        for (i, (c, p)) in curr.edge_angles.iter().zip(&prev.edge_angles).enumerate() {
            let delta = (c - p).abs();

            if delta > thresholds.handle_angle_delta {
                anomalies.push(Anomaly {
                    edge_index: Some(i),
                    ..Anomaly::new(
                        AnomalyKind::HandleAngleJump,
                        Severity::High,
                        delta,
                        thresholds.handle_angle_delta,
                        format!(
                            "Edge {i} angle jumped {delta:.2}° (threshold: {}°)",
                            thresholds.handle_angle_delta
                        ),
                    )
                });
            }
        }
    }

    let common = current.shape.anchors.iter().zip(&previous.shape.anchors).enumerate();

    for (i, (c, p)) in common {
        for (side, delta) in [
            (HandleSide::Out, geometry::distance(c.handle_out, p.handle_out)),
            (HandleSide::In, geometry::distance(c.handle_in, p.handle_in)),
        ] {
            if delta > thresholds.handle_jump {
                let label = match side {
                    HandleSide::In => "handleIn",
                    HandleSide::Out => "handleOut",
                };

                anomalies.push(Anomaly {
                    anchor_index: Some(i),
                    handle: Some(side),
                    ..Anomaly::new(
                        AnomalyKind::HandlePositionJump,
                        Severity::Medium,
                        delta,
                        thresholds.handle_jump,
                        format!(
                            "Anchor {i} {label} jumped {delta:.2}px (threshold: {}px)",
                            thresholds.handle_jump
                        ),
                    )
                });
            }
        }

        let moved = geometry::distance(c.pos, p.pos);

        if moved > thresholds.position_jump {
            anomalies.push(Anomaly {
                anchor_index: Some(i),
                ..Anomaly::new(
                    AnomalyKind::PositionJump,
                    Severity::Medium,
                    moved,
                    thresholds.position_jump,
                    format!(
                        "Anchor {i} moved {moved:.2}px (threshold: {}px)",
                        thresholds.position_jump
                    ),
                )
            });
        }
    }

    anomalies
}

/// Summary over all anomalies recorded in a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    pub total_frames: usize,
    pub anomaly_count: usize,
    pub anomalies_by_type: BTreeMap<AnomalyKind, usize>,
    pub max_symmetry: f64,
    pub max_symmetry_frame: Option<usize>,
    pub max_angle_jump: f64,
    pub max_angle_jump_frame: Option<usize>,
}

/// Serialized session, as written by [`Debugger::export_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameExport {
    pub frames: Vec<Frame>,
    pub anomalies: Vec<Anomaly>,
    pub thresholds: Thresholds,
    pub exported_at: String,
}

/// Called with every frame right after it is appended.
pub type FrameHook = fn(&Frame);

/// Called with a flagged frame and its anomalies, after the session pauses.
pub type AnomalyHook = fn(&Frame, &[Anomaly]);

#[derive(Debug, Clone, Default)]
pub struct Debugger {
    enabled: bool,
    auto_detect: bool,
    capturing: bool,
    paused: bool,
    frames: Vec<Frame>,
    current: usize,
    anomalies: Vec<Anomaly>,
    thresholds: Thresholds,
    frame_hook: Option<FrameHook>,
    anomaly_hook: Option<AnomalyHook>,
}

impl Debugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        tracing::debug!("debug mode enabled");
    }

    /// Also turns auto-detection off.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.auto_detect = false;
        tracing::debug!("debug mode disabled");
    }

    pub fn enable_auto_detect(&mut self, overrides: ThresholdOverrides) {
        self.auto_detect = true;
        self.thresholds = self.thresholds.merged(overrides);
        tracing::debug!(thresholds = ?self.thresholds, "auto-detect enabled");
    }

    pub fn on_frame_captured(&mut self, hook: FrameHook) {
        self.frame_hook = Some(hook);
    }

    pub fn on_anomaly_detected(&mut self, hook: AnomalyHook) {
        self.anomaly_hook = Some(hook);
    }

    pub fn start_capture(&mut self) {
        self.frames.clear();
        self.anomalies.clear();
        self.current = 0;
        self.capturing = true;
        self.paused = false;
        tracing::debug!("frame capture started");
    }

    pub fn stop_capture(&mut self) -> &[Frame] {
        self.capturing = false;
        tracing::debug!(frames = self.frames.len(), "frame capture stopped");
        &self.frames
    }

    /// Append a frame. `None` unless capturing.
    pub fn capture_frame(&mut self, shape: &Shape, params: &MorphParams, progress: f64, timestamp: f64) -> Option<&Frame> {
        if !self.capturing {
            return None;
        }

        let index = self.frames.len();
        let mut frame = Frame::new(index, shape, *params, progress, timestamp);

        if self.auto_detect {
            if let Some(previous) = self.frames.last() {
                let found = detect_anomalies(&frame, previous, &self.thresholds);

                if !found.is_empty() {
                    tracing::warn!(frame = index, count = found.len(), progress, "anomaly detected");

                    self.anomalies.extend(found.iter().cloned().map(|a| Anomaly {
                        frame_index: Some(index),
                        ..a
                    }));
                    frame.anomalies = found;
                    self.pause();

                    if let Some(hook) = self.anomaly_hook {
                        hook(&frame, &frame.anomalies);
                    }
                }
            }
        }

        tracing::trace!(frame = index, progress, anchors = shape.len(), "frame captured");

        self.frames.push(frame);
        self.current = index;

        let frame = self.frames.last()?;
        if let Some(hook) = self.frame_hook {
            hook(frame);
        }

        Some(frame)
    }

    pub fn pause(&mut self) {
        self.paused = true;
        tracing::debug!(frame = self.current, "paused");
    }

    pub fn resume(&mut self) {
        self.paused = false;
        tracing::debug!(frame = self.current, "resumed");
    }

    /// `None` on the last frame; the index stays put.
    pub fn step_forward(&mut self) -> Option<&Frame> {
        if self.current + 1 >= self.frames.len() {
            return None;
        }

        self.current += 1;
        tracing::debug!(frame = self.current, total = self.frames.len(), "stepped forward");
        self.frames.get(self.current)
    }

    /// `None` on the first frame; the index stays put.
    pub fn step_backward(&mut self) -> Option<&Frame> {
        if self.current == 0 || self.frames.is_empty() {
            return None;
        }

        self.current -= 1;
        tracing::debug!(frame = self.current, total = self.frames.len(), "stepped backward");
        self.frames.get(self.current)
    }

    /// Negative and past-the-end indices yield `None` without moving.
    pub fn jump_to_frame(&mut self, index: isize) -> Option<&Frame> {
        let index = usize::try_from(index).ok().filter(|&i| i < self.frames.len())?;

        self.current = index;
        tracing::debug!(frame = index, "jumped to frame");
        self.frames.get(index)
    }

    pub fn rewind(&mut self) -> Option<&Frame> {
        self.current = 0;
        tracing::debug!("rewound to frame 0");
        self.frames.first()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current)
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn current_frame_index(&self) -> usize {
        self.current
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_auto_detect_enabled(&self) -> bool {
        self.auto_detect
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn generate_report(&self) -> DebugReport {
        let mut report = DebugReport {
            total_frames: self.frames.len(),
            anomaly_count: self.anomalies.len(),
            ..DebugReport::default()
        };

        for a in &self.anomalies {
            *report.anomalies_by_type.entry(a.kind).or_default() += 1;

            match a.kind {
                AnomalyKind::SymmetrySpike if a.delta > report.max_symmetry => {
                    report.max_symmetry = a.delta;
                    report.max_symmetry_frame = a.frame_index;
                }
                AnomalyKind::HandleAngleJump if a.delta > report.max_angle_jump => {
                    report.max_angle_jump = a.delta;
                    report.max_angle_jump_frame = a.frame_index;
                }
                _ => {}
            }
        }

        report
    }

    pub fn export(&self) -> FrameExport {
        FrameExport {
            frames: self.frames.clone(),
            anomalies: self.anomalies.clone(),
            thresholds: self.thresholds,
            exported_at: snapshot::timestamp_now(),
        }
    }

    pub fn export_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Session state is unaffected if the write fails.
    pub fn write_export(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        fs::write(path, self.export_json()?)?;
        tracing::info!(path = %path.display(), frames = self.frames.len(), "exported frames");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use crate::geometry::Vector2;
    use crate::morph::MorphAnimation;

    fn triangle() -> Shape {
        MorphParams::default().rest_shape(&CanvasConfig::default())
    }

    fn frame(index: usize, shape: &Shape) -> Frame {
        Frame::new(index, shape, MorphParams::default(), 0.0, index as f64 * 16.0)
    }

    fn capturing(auto: bool) -> Debugger {
        let mut dbg = Debugger::new();
        dbg.enable();

        if auto {
            dbg.enable_auto_detect(ThresholdOverrides::default());
        }

        dbg.start_capture();
        dbg
    }

    #[test]
    fn single_edge_angle_jump() {
        let shape = triangle();
        let prev = frame(0, &shape);

        for k in 0..3 {
            let mut curr = frame(1, &shape);
            curr.metrics.edge_angles[k] += 7.5;

            let found = detect_anomalies(&curr, &prev, &Thresholds::default());

            assert_eq!(found.len(), 1);
            assert_eq!(found[0].kind, AnomalyKind::HandleAngleJump);
            assert_eq!(found[0].edge_index, Some(k));
            assert!((found[0].delta - 7.5).abs() < 1e-9);
        }
    }

    #[test]
    fn quiet_frames_have_no_anomalies() {
        let shape = triangle();
        let mut nudged = shape.clone();
        nudged.anchors[1].position.x += 1.0;
        nudged.anchors[1].handle_out.y += 2.0;

        let found = detect_anomalies(&frame(1, &nudged), &frame(0, &shape), &Thresholds::default());
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn angle_check_skipped_when_edge_counts_differ() {
        let shape = triangle();
        let prev = frame(0, &shape);
        let mut curr = frame(1, &shape);
        curr.metrics.edge_angles.push(170.0);
        curr.metrics.edge_angles[0] += 90.0;

        assert!(detect_anomalies(&curr, &prev, &Thresholds::default()).is_empty());
    }

    #[test]
    fn symmetry_spike_detected() {
        let shape = triangle();
        let prev = frame(0, &shape);
        let mut curr = frame(1, &shape);
        curr.metrics.symmetry += 150.0;

        let found = detect_anomalies(&curr, &prev, &Thresholds::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::SymmetrySpike);
        assert_eq!(found[0].severity, Severity::High);
    }

    #[test]
    fn handle_jumps_reported_per_side() {
        let shape = triangle();
        let mut moved = shape.clone();
        moved.anchors[2].handle_in = moved.anchors[2].handle_in + Vector2::new(0.0, 25.0);
        moved.anchors[0].handle_out = moved.anchors[0].handle_out + Vector2::new(-30.0, 0.0);

        let thresholds = Thresholds {
            symmetry_spike: f64::INFINITY,
            handle_angle_delta: f64::INFINITY,
            ..Thresholds::default()
        };
        let mut found = detect_anomalies(&frame(1, &moved), &frame(0, &shape), &thresholds);
        found.sort_by_key(|a| a.anchor_index);

        assert_eq!(found.len(), 2);
        assert_eq!((found[0].anchor_index, found[0].handle), (Some(0), Some(HandleSide::Out)));
        assert_eq!((found[1].anchor_index, found[1].handle), (Some(2), Some(HandleSide::In)));
        assert!(found.iter().all(|a| a.kind == AnomalyKind::HandlePositionJump));
    }

    #[test]
    fn position_jump_detected() {
        let shape = triangle();
        let mut moved = shape.clone();
        moved.anchors[1].position = moved.anchors[1].position + Vector2::new(8.0, 0.0);

        let thresholds = Thresholds {
            symmetry_spike: f64::INFINITY,
            handle_angle_delta: f64::INFINITY,
            ..Thresholds::default()
        };
        let found = detect_anomalies(&frame(1, &moved), &frame(0, &shape), &thresholds);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::PositionJump);
        assert_eq!(found[0].anchor_index, Some(1));
    }

    #[test]
    fn capture_requires_start() {
        let mut dbg = Debugger::new();
        assert!(dbg.capture_frame(&triangle(), &MorphParams::default(), 0.0, 0.0).is_none());
        assert!(dbg.frames().is_empty());
    }

    #[test]
    fn anomaly_pauses_capture() {
        let mut dbg = capturing(true);
        let shape = triangle();
        let mut broken = shape.clone();
        broken.anchors[0].handle_out = Vector2::new(500.0, 500.0);

        dbg.capture_frame(&shape, &MorphParams::default(), 0.0, 0.0);
        assert!(!dbg.is_paused());

        let tagged = dbg
            .capture_frame(&broken, &MorphParams::default(), 0.1, 16.0)
            .expect("capturing")
            .clone();

        assert!(dbg.is_paused());
        assert!(!tagged.anomalies.is_empty());
        assert!(dbg.anomalies().iter().all(|a| a.frame_index == Some(1)));
        assert!(tagged.anomalies.iter().all(|a| a.frame_index.is_none()));

        dbg.resume();
        assert!(!dbg.is_paused());
    }

    #[test]
    fn hooks_fire_on_capture_and_anomaly() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static FRAMES: AtomicUsize = AtomicUsize::new(0);
        static FLAGGED: AtomicUsize = AtomicUsize::new(0);

        fn count_frame(_: &Frame) {
            FRAMES.fetch_add(1, Ordering::SeqCst);
        }

        fn count_anomalies(frame: &Frame, anomalies: &[Anomaly]) {
            assert_eq!(frame.index, 1);
            FLAGGED.fetch_add(anomalies.len(), Ordering::SeqCst);
        }

        let mut dbg = capturing(true);
        dbg.on_frame_captured(count_frame);
        dbg.on_anomaly_detected(count_anomalies);

        let shape = triangle();
        let mut broken = shape.clone();
        broken.anchors[0].handle_out = Vector2::new(500.0, 500.0);

        dbg.capture_frame(&shape, &MorphParams::default(), 0.0, 0.0);
        assert_eq!(FLAGGED.load(Ordering::SeqCst), 0);

        dbg.capture_frame(&broken, &MorphParams::default(), 0.1, 16.0);

        assert_eq!(FRAMES.load(Ordering::SeqCst), 2);
        assert_eq!(FLAGGED.load(Ordering::SeqCst), dbg.anomalies().len());
        assert!(FLAGGED.load(Ordering::SeqCst) > 0);

        dbg.stop_capture();
        assert!(dbg.capture_frame(&shape, &MorphParams::default(), 0.2, 32.0).is_none());
        assert_eq!(FRAMES.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn detection_off_without_auto_detect() {
        let mut dbg = capturing(false);
        let shape = triangle();
        let mut broken = shape.clone();
        broken.anchors[0].handle_out = Vector2::new(500.0, 500.0);

        dbg.capture_frame(&shape, &MorphParams::default(), 0.0, 0.0);
        dbg.capture_frame(&broken, &MorphParams::default(), 0.1, 16.0);

        assert!(!dbg.is_paused());
        assert!(dbg.anomalies().is_empty());
    }

    #[test]
    fn playback_bounds() {
        let mut dbg = capturing(false);
        let shape = triangle();

        for i in 0..4 {
            dbg.capture_frame(&shape, &MorphParams::default(), i as f64 / 3.0, i as f64 * 16.0);
        }

        assert_eq!(dbg.current_frame_index(), 3);
        assert!(dbg.step_forward().is_none());
        assert_eq!(dbg.current_frame_index(), 3);

        assert_eq!(dbg.step_backward().map(|f| f.index), Some(2));
        assert!(dbg.jump_to_frame(-1).is_none());
        assert!(dbg.jump_to_frame(4).is_none());
        assert_eq!(dbg.current_frame_index(), 2);

        assert_eq!(dbg.rewind().map(|f| f.index), Some(0));
        assert!(dbg.step_backward().is_none());
        assert_eq!(dbg.current_frame_index(), 0);

        assert_eq!(dbg.jump_to_frame(3).map(|f| f.index), Some(3));
    }

    #[test]
    fn empty_session_playback() {
        let mut dbg = Debugger::new();

        assert!(dbg.step_forward().is_none());
        assert!(dbg.step_backward().is_none());
        assert!(dbg.rewind().is_none());
        assert!(dbg.jump_to_frame(0).is_none());
        assert!(dbg.current_frame().is_none());
    }

    #[test]
    fn start_capture_resets_session() {
        let mut dbg = capturing(true);
        let shape = triangle();
        let mut broken = shape.clone();
        broken.anchors[0].handle_out = Vector2::new(500.0, 500.0);

        dbg.capture_frame(&shape, &MorphParams::default(), 0.0, 0.0);
        dbg.capture_frame(&broken, &MorphParams::default(), 0.1, 16.0);
        dbg.start_capture();

        assert!(dbg.frames().is_empty());
        assert!(dbg.anomalies().is_empty());
        assert!(!dbg.is_paused());

        // First frame after a reset has no predecessor to compare against.
        dbg.capture_frame(&broken, &MorphParams::default(), 0.0, 0.0);
        assert!(dbg.anomalies().is_empty());
    }

    #[test]
    fn disable_turns_off_auto_detect() {
        let mut dbg = capturing(true);
        assert!(dbg.is_auto_detect_enabled());

        dbg.disable();
        assert!(!dbg.is_enabled());
        assert!(!dbg.is_auto_detect_enabled());
    }

    #[test]
    fn overrides_merge_into_thresholds() {
        let mut dbg = Debugger::new();
        dbg.enable_auto_detect(ThresholdOverrides {
            handle_jump: Some(2.0),
            ..ThresholdOverrides::default()
        });

        assert_eq!(dbg.thresholds().handle_jump, 2.0);
        assert_eq!(dbg.thresholds().symmetry_spike, 100.0);
    }

    #[test]
    fn report_tracks_largest_spikes() {
        let mut dbg = capturing(true);
        let shape = triangle();

        let mut frames = vec![shape.clone()];
        let mut small = shape.clone();
        small.anchors[0].handle_out = small.anchors[0].handle_out * 1.2;
        frames.push(small);
        let mut big = shape.clone();
        big.anchors[0].handle_out = big.anchors[0].handle_out * 3.0;
        frames.push(big);

        for (i, s) in frames.iter().enumerate() {
            dbg.capture_frame(s, &MorphParams::default(), i as f64 / 2.0, i as f64);
        }

        let report = dbg.generate_report();
        assert_eq!(report.total_frames, 3);
        assert_eq!(report.anomaly_count, dbg.anomalies().len());
        assert!(report.anomaly_count > 0);

        let angle_jumps: Vec<&Anomaly> = dbg
            .anomalies()
            .iter()
            .filter(|a| a.kind == AnomalyKind::HandleAngleJump)
            .collect();

        if let Some(max) = angle_jumps.iter().max_by(|a, b| a.delta.total_cmp(&b.delta)) {
            assert_eq!(report.max_angle_jump, max.delta);
            assert_eq!(report.max_angle_jump_frame, max.frame_index);
        }

        let by_type: usize = report.anomalies_by_type.values().sum();
        assert_eq!(by_type, report.anomaly_count);
    }

    #[test]
    fn smooth_morph_captures_cleanly() {
        let canvas = CanvasConfig::default();
        let params = MorphParams::default();
        let from = params.rest_shape(&canvas);
        let to = params.target_shape(&canvas);

        let mut morph = MorphAnimation::new();
        morph.start(&from, to, params, 0.0).expect("valid morph");

        let mut dbg = capturing(false);
        let mut ts = 0.0;

        while let Some(shape) = morph.update(ts) {
            dbg.capture_frame(&shape, &params, morph.progress(), ts);
            ts += 1000.0 / 60.0;
        }

        let frames = dbg.stop_capture();
        assert_eq!(frames.last().map(|f| f.progress), Some(1.0));
        assert!(frames.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(frames.last().map(|f| f.metrics.anchor_count), Some(4));
    }

    #[test]
    fn frame_rebuilds_shape() {
        let mut dbg = capturing(false);
        let shape = triangle();
        dbg.capture_frame(&shape, &MorphParams::default(), 0.0, 0.0);

        assert_eq!(dbg.current_frame().map(Frame::to_shape), Some(shape));
    }

    #[test]
    fn export_has_expected_keys() {
        let mut dbg = capturing(true);
        dbg.capture_frame(&triangle(), &MorphParams::default(), 0.0, 0.0);

        let json: serde_json::Value =
            serde_json::from_str(&dbg.export_json().expect("serializable")).expect("valid json");

        assert_eq!(json["frames"].as_array().map(Vec::len), Some(1));
        assert!(json["anomalies"].is_array());
        assert_eq!(json["thresholds"]["handleAngleDelta"], 5.0);
        assert!(json["exportedAt"].is_string());
    }

    #[test]
    fn export_to_missing_directory_fails_cleanly() {
        let mut dbg = capturing(false);
        dbg.capture_frame(&triangle(), &MorphParams::default(), 0.0, 0.0);

        let result = dbg.write_export("/nonexistent/floang/frames.json");
        assert!(matches!(result, Err(SnapshotError::Io(_))));
        assert_eq!(dbg.frames().len(), 1);
    }
}
