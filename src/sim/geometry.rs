//! Geometry primitives and overlap tests
//!
//! Everything here is pure math on circles, segments and the table bounds.
//! Tests report a `Contact` whose normal points from the collider toward the
//! body center, so pushing the body along `normal * penetration` separates it.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Normal used when two centers coincide and no direction can be derived
pub const FALLBACK_NORMAL: DVec2 = DVec2::new(0.0, -1.0);

/// Squared distance below which a direction is considered degenerate
const DEGENERATE_SQ: f64 = 1e-12;

/// Result of an overlap test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Contact point on the collider surface
    pub point: DVec2,
    /// Unit normal pointing toward the body center
    pub normal: DVec2,
    /// Overlap depth (for position correction)
    pub penetration: f64,
}

/// A circle (bumper, target, or a body's shape)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: DVec2, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// A line segment from `a` to `b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
}

impl Segment {
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    /// Closest point on the segment to `p`, with its parameter `t` in [0, 1]
    pub fn closest_point(&self, p: DVec2) -> (DVec2, f64) {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq < DEGENERATE_SQ {
            return (self.a, 0.0);
        }
        let t = ((p - self.a).dot(ab) / len_sq).clamp(0.0, 1.0);
        (self.a + ab * t, t)
    }
}

/// Axis-aligned playfield bounds (y grows downward; `max.y` is the drain line)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            min: DVec2::ZERO,
            max: DVec2::new(width, height),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// True once a circle has fully crossed the lower edge
    pub fn is_below(&self, center: DVec2, radius: f64) -> bool {
        center.y - radius > self.max.y
    }
}

/// Circle vs. static circle
pub fn circle_circle(center: DVec2, radius: f64, other: &Circle) -> Option<Contact> {
    let delta = center - other.center;
    let reach = radius + other.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist_sq < DEGENERATE_SQ {
        FALLBACK_NORMAL
    } else {
        delta / dist
    };

    Some(Contact {
        point: other.center + normal * other.radius,
        normal,
        penetration: reach - dist,
    })
}

/// Circle vs. a segment thickened by `thickness`
pub fn circle_segment(
    center: DVec2,
    radius: f64,
    segment: &Segment,
    thickness: f64,
) -> Option<Contact> {
    let (closest, _) = segment.closest_point(center);
    let delta = center - closest;
    let reach = radius + thickness;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist_sq < DEGENERATE_SQ {
        FALLBACK_NORMAL
    } else {
        delta / dist
    };

    Some(Contact {
        point: closest,
        normal,
        penetration: reach - dist,
    })
}

/// Circle vs. the side and top walls of the bounds
///
/// Returns the horizontal and vertical wall contacts separately since a body
/// in a corner touches both. The lower edge is open (it drains bodies).
pub fn circle_walls(
    center: DVec2,
    radius: f64,
    bounds: &Bounds,
) -> (Option<Contact>, Option<Contact>) {
    let horizontal = if center.x - radius < bounds.min.x {
        Some(Contact {
            point: DVec2::new(bounds.min.x, center.y),
            normal: DVec2::X,
            penetration: bounds.min.x - (center.x - radius),
        })
    } else if center.x + radius > bounds.max.x {
        Some(Contact {
            point: DVec2::new(bounds.max.x, center.y),
            normal: DVec2::NEG_X,
            penetration: center.x + radius - bounds.max.x,
        })
    } else {
        None
    };

    let vertical = if center.y - radius < bounds.min.y {
        Some(Contact {
            point: DVec2::new(center.x, bounds.min.y),
            normal: DVec2::Y,
            penetration: bounds.min.y - (center.y - radius),
        })
    } else {
        None
    };

    (horizontal, vertical)
}
