use std::collections::BTreeMap;

use crate::geometry::{self, HandlePair, Vector2};
use crate::params::MorphParams;
use crate::shape::{AnchorPoint, Segment, Shape, regular_position};

/// Share of the insertion tangent the newborn anchor's handles start with.
const INITIAL_HANDLE_RATIO: f64 = 0.2;

/// Handle values captured just before the new anchor was inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StoredHandle {
    pub handle_in: Option<Vector2>,
    pub handle_out: Option<Vector2>,
}

/// Pre-insertion handles keyed by anchor index, scoped to one morph.
///
/// The two neighbours of the emerging anchor ease from these values toward
/// their freshly computed handles instead of snapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredHandles {
    by_anchor: BTreeMap<usize, StoredHandle>,
}

impl StoredHandles {
    pub fn handle_in(&self, anchor: usize) -> Option<Vector2> {
        self.by_anchor.get(&anchor).and_then(|s| s.handle_in)
    }

    pub fn handle_out(&self, anchor: usize) -> Option<Vector2> {
        self.by_anchor.get(&anchor).and_then(|s| s.handle_out)
    }

    pub fn is_empty(&self) -> bool {
        self.by_anchor.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_anchor.clear();
    }

    fn store_in_once(&mut self, anchor: usize, handle: Vector2) {
        self.by_anchor.entry(anchor).or_default().handle_in.get_or_insert(handle);
    }

    fn store_out_once(&mut self, anchor: usize, handle: Vector2) {
        self.by_anchor.entry(anchor).or_default().handle_out.get_or_insert(handle);
    }
}

/// Circle the target shape's anchors sit on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularLayout {
    pub center: Vector2,
    pub radius: f64,
    pub rotation: f64,
    pub sides: usize,
}

impl RegularLayout {
    /// Recovers center, radius and phase from `shape`'s first anchor.
    pub fn of(shape: &Shape) -> Self {
        let center = shape.center;
        let (radius, rotation) = match shape.anchors.first() {
            Some(first) => {
                let offset = first.position - center;
                (offset.magnitude(), offset.y.atan2(offset.x))
            }
            None => (0.0, 0.0),
        };

        Self {
            center,
            radius,
            rotation,
            sides: shape.len(),
        }
    }

    pub fn position(&self, i: usize) -> Vector2 {
        regular_position(self.center, self.radius, self.rotation, self.sides, i)
    }
}

/// Shape at eased progress `t` of an n → n+1 morph.
///
/// `from` is never modified. `stored` is filled on the first call with
/// `t > 0` and read on every call after that. Pairs that are not a valid
/// n → n+1 morph (`n < 3`, or `to` without exactly one more anchor) come
/// back as an unchanged copy of `from`.
pub fn interpolate(
    from: &Shape,
    to: &Shape,
    t: f64,
    params: &MorphParams,
    stored: &mut StoredHandles,
) -> Shape {
    let from_sides = from.len();
    let to_sides = from_sides + 1;

    if from_sides < 3 || to.len() != to_sides {
        return from.clone();
    }

    let mut result = from.clone();

    if t > 0.0 && result.len() == from_sides {
        insert_anchor(&mut result, params.insertion_position, stored);
    }

    if result.len() == to_sides {
        let from_angle = geometry::orthogonal_angle(from_sides);
        let to_angle = geometry::orthogonal_angle(to_sides);
        let angle = from_angle + (to_angle - from_angle) * t;

        result.center = to.center;
        normalize_positions(&mut result, to, t, params);
        normalize_handles(&mut result, angle, t, params, stored);
        ease_emerging_handles(&mut result, angle, t, params);
    }

    result
}

/// Handles along the segment's tangent at `t`, scaled to a fraction of it.
/// Zero handles when the tangent vanishes.
pub fn tangent_handles(segment: &Segment, t: f64) -> HandlePair {
    let tangent = segment.tangent(t);

    let Some(dir) = tangent.direction() else {
        return HandlePair::ZERO;
    };

    let length = tangent.length * t * INITIAL_HANDLE_RATIO;

    HandlePair {
        handle_out: dir * length,
        handle_in: -dir * length,
    }
}

/// Split the closing segment (last → first) and append the new anchor.
fn insert_anchor(shape: &mut Shape, insertion: f64, stored: &mut StoredHandles) {
    let last = shape.len() - 1;
    let closing = shape.edge_segment(last);
    let handles = tangent_handles(&closing, insertion);

    stored.store_out_once(last, shape.anchors[last].handle_out);
    stored.store_in_once(0, shape.anchors[0].handle_in);

    shape.anchors.push(AnchorPoint {
        position: closing.evaluate(insertion),
        handle_in: handles.handle_in,
        handle_out: handles.handle_out,
    });
}

/// Emergence pull on the new anchor, then a regularity pull on every anchor.
/// The two rates are independent; `t * emergence_speed > 1` overshoots.
fn normalize_positions(shape: &mut Shape, to: &Shape, t: f64, params: &MorphParams) {
    let emerging = shape.len() - 1;
    let target = to.anchors[emerging].position;
    let anchor = &mut shape.anchors[emerging];
    anchor.position = geometry::lerp(anchor.position, target, t * params.emergence_speed);

    let layout = RegularLayout::of(to);
    let pull = t * params.symmetry_weight;

    for (i, anchor) in shape.anchors.iter_mut().enumerate() {
        anchor.position = geometry::lerp(anchor.position, layout.position(i), pull);
    }
}

fn normalize_handles(shape: &mut Shape, angle: f64, t: f64, params: &MorphParams, stored: &StoredHandles) {
    let len = shape.len();
    let emerging = len - 1;
    let before_emerging = emerging - 1;

    for i in 0..len {
        let next = (i + 1) % len;
        let fresh = geometry::edge_handles(
            shape.anchors[i].position,
            shape.anchors[next].position,
            angle,
            params.flow_factor,
        );

        let is_before = i == before_emerging;
        let is_after = i == emerging;

        match stored.handle_out(i) {
            Some(start) if is_before => {
                shape.anchors[i].handle_out = geometry::lerp(start, fresh.handle_out, t);
            }
            _ if !is_after => shape.anchors[i].handle_out = fresh.handle_out,
            _ => {}
        }

        match stored.handle_in(next) {
            Some(start) if is_after => {
                shape.anchors[next].handle_in = geometry::lerp(start, fresh.handle_in, t);
            }
            _ if !is_before => shape.anchors[next].handle_in = fresh.handle_in,
            _ => {}
        }
    }
}

/// Ease the new anchor from tangent-aligned handles to apex handles, and
/// pin the first anchor's incoming handle to the same apex.
fn ease_emerging_handles(shape: &mut Shape, angle: f64, t: f64, params: &MorphParams) {
    let emerging = shape.len() - 1;
    let prev = shape.anchors[emerging - 1];
    let first = shape.anchors[0];

    let bridge = Segment {
        p0: prev.position,
        cp1: prev.handle_out_absolute(),
        cp2: first.handle_in_absolute(),
        p3: first.position,
    };
    let initial = tangent_handles(&bridge, params.insertion_position);

    let position = shape.anchors[emerging].position;
    let outgoing = geometry::edge_handles(position, first.position, angle, params.flow_factor);
    let incoming = geometry::edge_handles(prev.position, position, angle, params.flow_factor);

    let anchor = &mut shape.anchors[emerging];
    anchor.handle_in = geometry::lerp(initial.handle_in, incoming.handle_in, t);
    anchor.handle_out = geometry::lerp(initial.handle_out, outgoing.handle_out, t);

    shape.anchors[0].handle_in = outgoing.handle_in;
}
