//! Table Sim - 2D ball, bumper and flipper simulation for browser table games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, collisions, game state)
//! - `tuning`: Data-driven physics constants
//! - `highscores`: Best-score board over an external key/value store
//! - `web`: Browser binding (wasm32 only)

pub mod highscores;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::{HighScores, MemoryStore, ScoreStore};
pub use sim::{GameStatus, LevelSet, Session, Side, Snapshot};
pub use tuning::Tuning;

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f64 = 1.0 / 120.0;
    /// Maximum substeps per update to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted by `update` (long stalls are clamped)
    pub const DT_MAX: f64 = 0.1;

    /// Default table dimensions (px)
    pub const TABLE_WIDTH: f64 = 400.0;
    pub const TABLE_HEIGHT: f64 = 600.0;

    /// Ball defaults
    pub const BODY_RADIUS: f64 = 10.0;
    pub const BODY_MAX_SPEED: f64 = 1800.0;

    /// Wall restitution (lossy bounce)
    pub const WALL_RESTITUTION: f64 = 0.8;

    /// Flipper defaults
    pub const FLIPPER_THICKNESS: f64 = 8.0;
    /// Radians per tick
    pub const FLIPPER_RATE: f64 = 0.2;
    pub const FLIPPER_REST_ANGLE: f64 = 0.5;
    pub const FLIPPER_ACTIVE_ANGLE: f64 = -0.5;

    /// Default lives per level
    pub const DEFAULT_LIVES: u32 = 3;
}

/// Unit vector pointing along `angle` (radians, y down)
#[inline]
pub fn unit_from_angle(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Counter-clockwise perpendicular (in y-down screen space this is the
/// direction a point moves when its angle increases)
#[inline]
pub fn perp(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}
