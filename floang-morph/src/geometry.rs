use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// `None` for the zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.magnitude();

        if len > 0.0 {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Derivative of a cubic segment, with its length cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tangent {
    pub dx: f64,
    pub dy: f64,
    pub length: f64,
}

impl Tangent {
    pub fn direction(&self) -> Option<Vector2> {
        if self.length > 0.0 {
            Some(Vector2::new(self.dx / self.length, self.dy / self.length))
        } else {
            None
        }
    }
}

/// Outgoing handle for the first endpoint, incoming handle for the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlePair {
    pub handle_out: Vector2,
    pub handle_in: Vector2,
}

impl HandlePair {
    pub const ZERO: Self = Self {
        handle_out: Vector2::ZERO,
        handle_in: Vector2::ZERO,
    };
}

/// Apex angle (degrees) that yields a regular silhouette for a ring of `sides` anchors.
pub fn orthogonal_angle(sides: usize) -> f64 {
    let n = sides as f64;
    (n - 2.0) * 180.0 / n
}

/// Rotated a quarter turn clockwise in screen coordinates.
pub fn perpendicular(d: Vector2) -> Vector2 {
    Vector2::new(d.y, -d.x)
}

/// Third point of the isoceles triangle on base `p1 → p2` whose apex angle is
/// `angle_degrees`. `None` when the base has zero length.
pub fn apex(p1: Vector2, p2: Vector2, angle_degrees: f64) -> Option<Vector2> {
    let base = p2 - p1;
    let base_length = base.magnitude();
    let normal = perpendicular(base).normalized()?;

    let half_angle = angle_degrees.to_radians() / 2.0;
    let height = (base_length / 2.0) / half_angle.tan();
    let mid = lerp(p1, p2, 0.5);

    Some(mid + normal * height)
}

pub fn handles_from_apex(p1: Vector2, p2: Vector2, apex: Vector2, flow_factor: f64) -> HandlePair {
    HandlePair {
        handle_out: (apex - p1) * flow_factor,
        handle_in: (apex - p2) * flow_factor,
    }
}

/// Apex construction followed by handle derivation; zero handles for a
/// degenerate edge.
pub fn edge_handles(p1: Vector2, p2: Vector2, angle_degrees: f64, flow_factor: f64) -> HandlePair {
    match apex(p1, p2, angle_degrees) {
        Some(apex) => handles_from_apex(p1, p2, apex, flow_factor),
        None => HandlePair::ZERO,
    }
}

pub fn evaluate_bezier(p0: Vector2, cp1: Vector2, cp2: Vector2, p3: Vector2, t: f64) -> Vector2 {
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let mt3 = mt2 * mt;
    let t2 = t * t;
    let t3 = t2 * t;

    Vector2::new(
        mt3 * p0.x + 3.0 * mt2 * t * cp1.x + 3.0 * mt * t2 * cp2.x + t3 * p3.x,
        mt3 * p0.y + 3.0 * mt2 * t * cp1.y + 3.0 * mt * t2 * cp2.y + t3 * p3.y,
    )
}

pub fn bezier_tangent(p0: Vector2, cp1: Vector2, cp2: Vector2, p3: Vector2, t: f64) -> Tangent {
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let t2 = t * t;

    let dx = 3.0 * (mt2 * (cp1.x - p0.x) + 2.0 * mt * t * (cp2.x - cp1.x) + t2 * (p3.x - cp2.x));
    let dy = 3.0 * (mt2 * (cp1.y - p0.y) + 2.0 * mt * t * (cp2.y - cp1.y) + t2 * (p3.y - cp2.y));

    Tangent {
        dx,
        dy,
        length: (dx * dx + dy * dy).sqrt(),
    }
}

/// Not clamped: `t` outside `[0, 1]` extrapolates.
pub fn lerp(a: Vector2, b: Vector2, t: f64) -> Vector2 {
    Vector2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

pub fn distance(p1: Vector2, p2: Vector2) -> f64 {
    (p2 - p1).magnitude()
}

pub fn magnitude(v: Vector2) -> f64 {
    v.magnitude()
}

/// Population variance. Zero for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
