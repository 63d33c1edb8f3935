//! Game state and core simulation types
//!
//! Plain structs stored in flat vectors; a body, target or bumper is
//! addressed by its index in the owning collection.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::Circle;

/// Lifecycle of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Level loaded, nothing served yet
    Waiting,
    /// A body is in play or waiting to be relaunched
    Playing,
    /// Every target was hit
    Won,
    /// Last life drained
    Lost,
}

impl GameStatus {
    /// Won and Lost only leave through an explicit restart
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

/// A moving ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    /// Inactive bodies are parked: not integrated, not collided
    pub active: bool,
}

impl Body {
    /// A parked body at `pos`
    pub fn new(id: u32, pos: DVec2, radius: f64) -> Self {
        Self {
            id,
            pos,
            vel: DVec2::ZERO,
            radius,
            active: false,
        }
    }

    /// Put the body into play at `pos` moving at `vel`
    pub fn serve(&mut self, pos: DVec2, vel: DVec2) {
        self.pos = pos;
        self.vel = vel;
        self.active = true;
    }

    /// Take the body out of play and move it back to `pos` at rest
    pub fn park(&mut self, pos: DVec2) {
        self.pos = pos;
        self.vel = DVec2::ZERO;
        self.active = false;
    }
}

/// A one-shot scoring target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub pos: DVec2,
    pub radius: f64,
    pub points: u32,
    /// Only ever goes false -> true within a level
    pub hit: bool,
}

impl Target {
    pub fn new(pos: DVec2, radius: f64, points: u32) -> Self {
        Self {
            pos,
            radius,
            points,
            hit: false,
        }
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.pos, self.radius)
    }

    /// Mark as hit. Returns true only the first time.
    pub fn mark_hit(&mut self) -> bool {
        let first = !self.hit;
        self.hit = true;
        first
    }
}

/// An always-reactive round kicker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bumper {
    pub pos: DVec2,
    pub radius: f64,
    /// Speed the body leaves with
    pub impulse: f64,
    pub points: u32,
}

impl Bumper {
    pub fn circle(&self) -> Circle {
        Circle::new(self.pos, self.radius)
    }
}

/// Something that happened during a tick (for audio/visual feedback)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    Launched { body: u32 },
    WallHit { body: u32 },
    BumperHit { body: u32, bumper: usize, points: u32 },
    TargetHit { body: u32, target: usize, points: u32 },
    FlipperHit { body: u32, side: super::flipper::Side },
    BodyContact { a: u32, b: u32 },
    BodyDrained { body: u32 },
    LifeLost { lives: u32 },
    Won { score: u64 },
    Lost { score: u64 },
}

/// Score, lives and status for the current level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Never decreases within a level
    pub score: u64,
    /// Never increases during play
    pub lives: u32,
    pub level_index: u32,
    pub status: GameStatus,
    /// Simulation steps run since `start`
    pub time_ticks: u64,
}

impl GameState {
    pub fn new(level_index: u32, lives: u32) -> Self {
        Self {
            score: 0,
            lives,
            level_index,
            status: GameStatus::Waiting,
            time_ticks: 0,
        }
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(u64::from(points));
    }
}
