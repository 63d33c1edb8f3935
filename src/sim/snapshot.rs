//! Immutable per-tick view of the table for renderers

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::flipper::{Flipper, Side};
use super::state::{Body, Bumper, GameEvent, GameStatus, Target};
use super::tick::Table;

/// Flipper geometry as drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipperView {
    pub side: Side,
    pub pivot: DVec2,
    pub tip: DVec2,
    pub angle: f64,
    pub thickness: f64,
}

impl FlipperView {
    fn new(flipper: &Flipper, thickness: f64) -> Self {
        Self {
            side: flipper.side,
            pivot: flipper.pivot,
            tip: flipper.tip(),
            angle: flipper.angle,
            thickness,
        }
    }
}

/// Complete observable state after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub bodies: Vec<Body>,
    pub targets: Vec<Target>,
    pub bumpers: Vec<Bumper>,
    pub flippers: Vec<FlipperView>,
    pub score: u64,
    pub lives: u32,
    pub level_index: u32,
    pub status: GameStatus,
    pub width: f64,
    pub height: f64,
    /// What happened since the previous snapshot
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn capture(table: &Table, flipper_thickness: f64, events: Vec<GameEvent>) -> Self {
        Self {
            bodies: table.bodies.clone(),
            targets: table.level.targets.clone(),
            bumpers: table.level.bumpers.clone(),
            flippers: table
                .level
                .flippers
                .iter()
                .map(|f| FlipperView::new(f, flipper_thickness))
                .collect(),
            score: table.state.score,
            lives: table.state.lives,
            level_index: table.state.level_index,
            status: table.state.status,
            width: table.bounds.width(),
            height: table.bounds.height(),
            events,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data only; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
