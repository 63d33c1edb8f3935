//! Physics tuning
//!
//! Every constant the simulation reads lives here so a table can be
//! re-balanced from JSON without touching code.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Error raised when tuning data cannot be used
#[derive(Debug, Error)]
pub enum TuningError {
    /// The JSON could not be parsed
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field is outside its valid range
    #[error("tuning field `{field}` out of range: {value}")]
    Invalid { field: &'static str, value: f64 },
}

/// Physics and gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Integration ===
    /// Acceleration applied to every active body (px/s², y down)
    pub gravity: DVec2,
    /// Per-tick multiplicative velocity decay
    pub friction: f64,
    /// Speed cap applied after friction
    pub max_speed: f64,

    // === Bodies ===
    pub body_radius: f64,
    /// Velocity given to a body when it is served
    pub serve_velocity: DVec2,

    // === Walls ===
    /// Fraction of the normal speed kept after a wall bounce
    pub restitution: f64,

    // === Bumpers / targets ===
    /// Kick speed for bumpers that don't set their own
    pub bumper_impulse: f64,
    /// Points for bumpers that don't set their own
    pub bumper_points: u32,
    pub target_radius: f64,
    /// Outward speed added when a target pops
    pub target_pop: f64,

    // === Flippers ===
    pub flipper_thickness: f64,
    /// Bounce speed off a flipper regardless of swing
    pub flipper_base_force: f64,
    /// Extra speed per rad/s of upswing
    pub flipper_tangential_factor: f64,
    /// Radians per tick
    pub flipper_rate: f64,
    /// Left flipper angles (the right flipper mirrors them)
    pub flipper_rest_angle: f64,
    pub flipper_active_angle: f64,
    /// Pivot placement as fractions of table size
    pub flipper_pivot_x: f64,
    pub flipper_pivot_y: f64,
    /// Flipper length as a fraction of table width
    pub flipper_length: f64,

    // === Timestep ===
    /// Drive fixed `SIM_DT` steps from an accumulator instead of raw frame deltas
    pub fixed_timestep: bool,
    pub dt_max: f64,
    pub max_substeps: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: DVec2::new(0.0, 900.0),
            friction: 0.995,
            max_speed: BODY_MAX_SPEED,

            body_radius: BODY_RADIUS,
            serve_velocity: DVec2::new(60.0, -120.0),

            restitution: WALL_RESTITUTION,

            bumper_impulse: 520.0,
            bumper_points: 10,
            target_radius: 12.0,
            target_pop: 60.0,

            flipper_thickness: FLIPPER_THICKNESS,
            flipper_base_force: 260.0,
            flipper_tangential_factor: 20.0,
            flipper_rate: FLIPPER_RATE,
            flipper_rest_angle: FLIPPER_REST_ANGLE,
            flipper_active_angle: FLIPPER_ACTIVE_ANGLE,
            flipper_pivot_x: 0.28,
            flipper_pivot_y: 0.88,
            flipper_length: 0.18,

            fixed_timestep: true,
            dt_max: DT_MAX,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON (missing fields keep defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let checks: [(&'static str, f64, bool); 7] = [
            ("friction", self.friction, self.friction > 0.0 && self.friction <= 1.0),
            ("restitution", self.restitution, (0.0..=1.0).contains(&self.restitution)),
            ("body_radius", self.body_radius, self.body_radius > 0.0),
            ("target_radius", self.target_radius, self.target_radius > 0.0),
            ("flipper_rate", self.flipper_rate, self.flipper_rate > 0.0),
            ("max_speed", self.max_speed, self.max_speed > 0.0),
            ("dt_max", self.dt_max, self.dt_max > 0.0),
        ];
        for (field, value, ok) in checks {
            if !ok {
                return Err(TuningError::Invalid { field, value });
            }
        }
        if self.max_substeps == 0 {
            return Err(TuningError::Invalid {
                field: "max_substeps",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Tuning with gravity and friction switched off (billiard-style tables)
    pub fn frictionless() -> Self {
        Self {
            gravity: DVec2::ZERO,
            friction: 1.0,
            ..Self::default()
        }
    }
}
