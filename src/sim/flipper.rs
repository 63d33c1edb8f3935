//! Flippers: segments swung toward a target angle at a bounded rate

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Bounds, Segment};
use crate::tuning::Tuning;
use crate::unit_from_angle;

/// Which flipper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Sign of the angular velocity while this side swings up
    /// (angles grow clockwise on screen since y points down)
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    /// Mirror a left-flipper angle onto this side
    fn mirror(self, left_angle: f64) -> f64 {
        match self {
            Side::Left => left_angle,
            Side::Right => std::f64::consts::PI - left_angle,
        }
    }
}

/// Move `angle` toward `target` by at most `rate`
///
/// Snaps once the remaining gap is within `rate`, so a gap `g` closes in
/// exactly `ceil(g / rate)` calls.
pub fn ease(angle: f64, target: f64, rate: f64) -> f64 {
    let gap = target - angle;
    if gap.abs() > rate {
        angle + rate.copysign(gap)
    } else {
        target
    }
}

/// An actuated flipper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flipper {
    pub side: Side,
    pub pivot: DVec2,
    pub length: f64,
    /// Current angle (radians)
    pub angle: f64,
    /// Angle the flipper is easing toward
    pub target_angle: f64,
    /// Angle change during the last tick divided by its dt (rad/s)
    pub angular_vel: f64,
    rest_angle: f64,
    active_angle: f64,
}

impl Flipper {
    /// A flipper at rest, placed for a table of the given bounds
    pub fn new(side: Side, bounds: &Bounds, tuning: &Tuning) -> Self {
        let rest_angle = side.mirror(tuning.flipper_rest_angle);
        let active_angle = side.mirror(tuning.flipper_active_angle);
        let mut flipper = Self {
            side,
            pivot: DVec2::ZERO,
            length: 0.0,
            angle: rest_angle,
            target_angle: rest_angle,
            angular_vel: 0.0,
            rest_angle,
            active_angle,
        };
        flipper.place(bounds, tuning);
        flipper
    }

    /// Recompute pivot and length from the table bounds
    pub fn place(&mut self, bounds: &Bounds, tuning: &Tuning) {
        let x_frac = match self.side {
            Side::Left => tuning.flipper_pivot_x,
            Side::Right => 1.0 - tuning.flipper_pivot_x,
        };
        self.pivot = DVec2::new(
            bounds.min.x + bounds.width() * x_frac,
            bounds.min.y + bounds.height() * tuning.flipper_pivot_y,
        );
        self.length = bounds.width() * tuning.flipper_length;
    }

    /// Button state maps onto one of the two fixed angles
    pub fn set_pressed(&mut self, pressed: bool) {
        self.target_angle = if pressed {
            self.active_angle
        } else {
            self.rest_angle
        };
    }

    /// Advance one tick toward the target angle
    pub fn step(&mut self, rate: f64, dt: f64) {
        let next = ease(self.angle, self.target_angle, rate);
        self.angular_vel = if dt > 0.0 { (next - self.angle) / dt } else { 0.0 };
        self.angle = next;
    }

    pub fn tip(&self) -> DVec2 {
        self.pivot + unit_from_angle(self.angle) * self.length
    }

    pub fn segment(&self) -> Segment {
        Segment::new(self.pivot, self.tip())
    }

    /// Angular speed in the upswing direction (negative while falling back)
    pub fn upswing(&self) -> f64 {
        self.angular_vel * self.side.sign()
    }
}
