//! Named "known good" shape states and tolerance-based regression diffs.

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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldenSnapshot {
    pub name: String,
    pub captured_at: String,
    pub params: MorphParams,
    pub shape: ShapeSnapshot,
    pub metrics: Metrics,
}

/// Allowed drift per comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tolerance {
    /// Degrees.
    pub angle_diff: f64,
    pub symmetry_diff: f64,
    pub position_delta: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            angle_diff: 1.0,
            symmetry_diff: 5.0,
            position_delta: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountComparison {
    pub golden: usize,
    pub current: usize,
    pub matches: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymmetryComparison {
    pub golden: f64,
    pub current: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeAngleDiff {
    pub edge: usize,
    pub golden: f64,
    pub current: f64,
    pub diff: f64,
    pub within_tolerance: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDelta {
    pub anchor: usize,
    pub delta: f64,
    pub within_tolerance: bool,
}

/// Result of comparing a live shape with a stored snapshot. Per-edge and
/// per-anchor entries are empty when the anchor counts differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldenDiff {
    pub name: String,
    pub anchor_count: CountComparison,
    pub symmetry: SymmetryComparison,
    pub edge_angle_diffs: Vec<EdgeAngleDiff>,
    pub position_deltas: Vec<PositionDelta>,
    pub max_angle_diff: f64,
    pub max_position_delta: f64,
    pub within_tolerance: bool,
}

/// Row of [`GoldenRegistry::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub name: String,
    pub captured_at: String,
    pub anchors: usize,
    pub symmetry: f64,
    pub params: MorphParams,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoldenRegistry {
    snapshots: BTreeMap<String, GoldenSnapshot>,
}

impl GoldenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any snapshot already stored under `name`.
    pub fn capture(&mut self, name: impl Into<String>, shape: &Shape, params: &MorphParams) -> &GoldenSnapshot {
        let name = name.into();
        let snapshot = GoldenSnapshot {
            name: name.clone(),
            captured_at: snapshot::timestamp_now(),
            params: *params,
            shape: ShapeSnapshot::capture(shape),
            metrics: Metrics::of(shape),
        };

        tracing::info!(
            name = name.as_str(),
            anchors = snapshot.metrics.anchor_count,
            symmetry = snapshot.metrics.symmetry,
            "captured golden snapshot"
        );

        self.snapshots.insert(name.clone(), snapshot);
        &self.snapshots[&name]
    }

    /// `None` when no snapshot is stored under `name`.
    pub fn compare(&self, name: &str, current: &Shape, tolerance: &Tolerance) -> Option<GoldenDiff> {
        let Some(golden) = self.snapshots.get(name) else {
            tracing::warn!(name, "golden snapshot not found");
            return None;
        };

        let metrics = Metrics::of(current);
        let symmetry_diff = (metrics.symmetry - golden.metrics.symmetry).abs();

        let mut diff = GoldenDiff {
            name: golden.name.clone(),
            anchor_count: CountComparison {
                golden: golden.metrics.anchor_count,
                current: metrics.anchor_count,
                matches: golden.metrics.anchor_count == metrics.anchor_count,
            },
            symmetry: SymmetryComparison {
                golden: golden.metrics.symmetry,
                current: metrics.symmetry,
                diff: symmetry_diff,
            },
            edge_angle_diffs: Vec::new(),
            position_deltas: Vec::new(),
            max_angle_diff: 0.0,
            max_position_delta: 0.0,
            within_tolerance: symmetry_diff <= tolerance.symmetry_diff,
        };

        if golden.metrics.edge_angles.len() == metrics.edge_angles.len() {
            for (edge, (&g, &c)) in golden.metrics.edge_angles.iter().zip(&metrics.edge_angles).enumerate() {
                let d = (g - c).abs();
                let ok = d <= tolerance.angle_diff;

                diff.edge_angle_diffs.push(EdgeAngleDiff {
                    edge,
                    golden: g,
                    current: c,
                    diff: d,
                    within_tolerance: ok,
                });
                diff.max_angle_diff = diff.max_angle_diff.max(d);
                diff.within_tolerance &= ok;
            }
        }

        if golden.shape.len() == current.len() {
            for (anchor, (g, c)) in golden.shape.anchors.iter().zip(&current.anchors).enumerate() {
                let delta = geometry::distance(g.pos, c.position);
                let ok = delta <= tolerance.position_delta;

                diff.position_deltas.push(PositionDelta {
                    anchor,
                    delta,
                    within_tolerance: ok,
                });
                diff.max_position_delta = diff.max_position_delta.max(delta);
                diff.within_tolerance &= ok;
            }
        }

        tracing::debug!(
            name,
            within_tolerance = diff.within_tolerance,
            max_angle_diff = diff.max_angle_diff,
            max_position_delta = diff.max_position_delta,
            "compared against golden snapshot"
        );

        Some(diff)
    }

    pub fn load(&self, name: &str) -> Option<&GoldenSnapshot> {
        self.snapshots.get(name)
    }

    /// Sorted by name.
    pub fn list(&self) -> Vec<SnapshotSummary> {
        self.snapshots
            .values()
            .map(|s| SnapshotSummary {
                name: s.name.clone(),
                captured_at: s.captured_at.clone(),
                anchors: s.metrics.anchor_count,
                symmetry: s.metrics.symmetry,
                params: s.params,
            })
            .collect()
    }

    pub fn delete(&mut self, name: &str) -> bool {
        let deleted = self.snapshots.remove(name).is_some();

        if deleted {
            tracing::info!(name, "deleted golden snapshot");
        }

        deleted
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn export(&self, name: &str) -> Result<String, SnapshotError> {
        let snapshot = self
            .snapshots
            .get(name)
            .ok_or_else(|| SnapshotError::NotFound(name.to_string()))?;

        Ok(serde_json::to_string_pretty(snapshot)?)
    }

    /// Every snapshot in one JSON object keyed by name.
    pub fn export_all(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.snapshots)?)
    }

    /// Store a single exported snapshot, optionally under a new name.
    pub fn import(&mut self, json: &str, rename: Option<&str>) -> Result<&GoldenSnapshot, SnapshotError> {
        let mut snapshot: GoldenSnapshot = serde_json::from_str(json)?;

        if let Some(name) = rename {
            snapshot.name = name.to_string();
        }

        let name = snapshot.name.clone();
        tracing::info!(name = name.as_str(), "imported golden snapshot");

        self.snapshots.insert(name.clone(), snapshot);
        Ok(&self.snapshots[&name])
    }

    /// Merge a name-keyed export. Nothing is stored if parsing fails.
    pub fn import_all(&mut self, json: &str) -> Result<usize, SnapshotError> {
        let incoming: BTreeMap<String, GoldenSnapshot> = serde_json::from_str(json)?;
        let count = incoming.len();

        for (key, mut snapshot) in incoming {
            snapshot.name = key.clone();
            self.snapshots.insert(key, snapshot);
        }

        Ok(count)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        fs::write(path, self.export_all()?)?;
        tracing::info!(path = %path.display(), count = self.snapshots.len(), "saved golden snapshots");
        Ok(())
    }

    /// Merge snapshots from a file written by [`GoldenRegistry::save_to`].
    /// The registry is unchanged on failure.
    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<usize, SnapshotError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let count = self.import_all(&json)?;
        tracing::info!(path = %path.display(), count, "loaded golden snapshots");
        Ok(count)
    }
}
