//! Fixed timestep simulation tick
//!
//! One step runs actuators, integration, collision resolution and the status
//! rules, in that order, to completion.

use glam::DVec2;

use super::collision;
use super::geometry::Bounds;
use super::integrate::integrate;
use super::level::{Level, LevelRecord};
use super::state::{Body, GameEvent, GameState, GameStatus};
use crate::tuning::Tuning;

/// Everything a tick mutates: bounds, level contents, bodies and score
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub bounds: Bounds,
    pub level: Level,
    /// Indexed by body id
    pub bodies: Vec<Body>,
    pub state: GameState,
}

impl Table {
    /// Fresh level in `Waiting` with all bodies parked at the spawn
    pub fn new(record: &LevelRecord, index: u32, bounds: Bounds, tuning: &Tuning) -> Self {
        let level = Level::build(record, index, &bounds, tuning);
        let state = GameState::new(index, level.lives);
        let mut table = Self {
            bounds,
            level,
            bodies: Vec::new(),
            state,
        };
        table.bodies = (0..table.level.balls)
            .map(|id| {
                let pos = table.level.serve_position(id, tuning.body_radius);
                Body::new(id, pos, tuning.body_radius)
            })
            .collect();
        table
    }

    /// Where body `id` waits before a launch
    pub fn serve_position(&self, id: u32) -> DVec2 {
        let radius = self.bodies.get(id as usize).map_or(0.0, |b| b.radius);
        self.level.serve_position(id, radius)
    }

    pub fn has_active_body(&self) -> bool {
        self.bodies.iter().any(|b| b.active)
    }

    /// Serve every parked body. No-op while a body is in play or the level
    /// is over. Returns true if bodies were served.
    pub fn launch(&mut self, tuning: &Tuning, events: &mut Vec<GameEvent>) -> bool {
        if self.state.status.is_terminal() || self.has_active_body() {
            return false;
        }

        for id in 0..self.bodies.len() {
            let pos = self.serve_position(id as u32);
            let body = &mut self.bodies[id];
            body.serve(pos, tuning.serve_velocity);
            events.push(GameEvent::Launched { body: body.id });
        }
        if self.state.status == GameStatus::Waiting {
            self.state.status = GameStatus::Playing;
        }
        true
    }

    /// Re-place size-dependent geometry; bodies are not moved
    pub fn resize(&mut self, width: f64, height: f64, tuning: &Tuning) {
        self.bounds = Bounds::from_size(width, height);
        for flipper in &mut self.level.flippers {
            flipper.place(&self.bounds, tuning);
        }
    }
}

/// Advance the table by one step of `dt`
///
/// Terminal levels are frozen: nothing moves and nothing scores.
pub fn tick(table: &mut Table, tuning: &Tuning, dt: f64, events: &mut Vec<GameEvent>) {
    if table.state.status.is_terminal() {
        return;
    }

    table.state.time_ticks += 1;

    for flipper in &mut table.level.flippers {
        flipper.step(tuning.flipper_rate, dt);
    }

    if table.state.status != GameStatus::Playing {
        return;
    }

    for body in &mut table.bodies {
        integrate(body, tuning.gravity, tuning.friction, tuning.max_speed, dt);
    }

    collision::resolve(table, tuning, events);

    if table.level.all_targets_hit() {
        table.state.status = GameStatus::Won;
        log::info!(
            "Level {} won with score {}",
            table.state.level_index,
            table.state.score
        );
        events.push(GameEvent::Won {
            score: table.state.score,
        });
        return;
    }

    drain(table, events);
}

/// Deactivate bodies below the table; the last one out costs a life
fn drain(table: &mut Table, events: &mut Vec<GameEvent>) {
    let mut drained = false;
    for body in &mut table.bodies {
        if body.active && table.bounds.is_below(body.pos, body.radius) {
            body.active = false;
            drained = true;
            log::debug!("Body {} drained", body.id);
            events.push(GameEvent::BodyDrained { body: body.id });
        }
    }

    if !drained || table.has_active_body() {
        return;
    }

    table.state.lives = table.state.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost {
        lives: table.state.lives,
    });

    if table.state.lives == 0 {
        table.state.status = GameStatus::Lost;
        log::info!(
            "Level {} lost with score {}",
            table.state.level_index,
            table.state.score
        );
        events.push(GameEvent::Lost {
            score: table.state.score,
        });
        return;
    }

    for id in 0..table.bodies.len() {
        let pos = table.serve_position(id as u32);
        table.bodies[id].park(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::level::{LevelSet, PointRecord, TargetRecord};

    fn record(targets: Vec<TargetRecord>, lives: u32, balls: u32) -> LevelRecord {
        LevelRecord {
            targets,
            bumpers: Vec::new(),
            spawn: PointRecord { x: 200.0, y: 60.0 },
            lives,
            balls,
        }
    }

    fn table_for(record: &LevelRecord) -> Table {
        Table::new(
            record,
            0,
            Bounds::from_size(TABLE_WIDTH, TABLE_HEIGHT),
            &Tuning::default(),
        )
    }

    fn far_target() -> TargetRecord {
        TargetRecord {
            x: 20.0,
            y: 20.0,
            points: 100,
            radius: Some(5.0),
        }
    }

    #[test]
    fn test_tick_waiting_to_playing() {
        let tuning = Tuning::default();
        let mut table = table_for(&record(vec![far_target()], 3, 1));
        let mut events = Vec::new();
        assert_eq!(table.state.status, GameStatus::Waiting);
        assert!(!table.has_active_body());

        // Ticks without launch stay in Waiting and leave the body parked
        tick(&mut table, &tuning, SIM_DT, &mut events);
        assert_eq!(table.state.status, GameStatus::Waiting);
        assert_eq!(table.bodies[0].pos, DVec2::new(200.0, 60.0));

        assert!(table.launch(&tuning, &mut events));
        assert_eq!(table.state.status, GameStatus::Playing);
        assert_eq!(table.bodies[0].vel, tuning.serve_velocity);
        assert_eq!(events, vec![GameEvent::Launched { body: 0 }]);
    }

    #[test]
    fn test_multi_ball_spread() {
        let table = table_for(&record(vec![far_target()], 3, 2));
        assert_eq!(table.bodies.len(), 2);
        let gap = table.bodies[1].pos.x - table.bodies[0].pos.x;
        assert!((gap - 25.0).abs() < 1e-9);
        assert!((table.bodies[0].pos.x + table.bodies[1].pos.x - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_life_lost_only_when_last_ball_drains() {
        let tuning = Tuning::default();
        let mut table = table_for(&record(vec![far_target()], 3, 2));
        let mut events = Vec::new();
        table.launch(&tuning, &mut events);

        table.bodies[0].pos = DVec2::new(100.0, 700.0);
        tick(&mut table, &tuning, SIM_DT, &mut events);
        assert_eq!(table.state.lives, 3);
        assert!(!table.bodies[0].active);
        assert!(table.bodies[1].active);

        table.bodies[1].pos = DVec2::new(300.0, 700.0);
        tick(&mut table, &tuning, SIM_DT, &mut events);
        assert_eq!(table.state.lives, 2);
        assert_eq!(table.state.status, GameStatus::Playing);
        // Both parked back at the spawn, awaiting a launch
        assert!(!table.has_active_body());
        assert_eq!(table.bodies[0].pos, table.serve_position(0));
        assert_eq!(table.bodies[1].vel, DVec2::ZERO);

        assert!(table.launch(&tuning, &mut events));
        assert!(table.bodies.iter().all(|b| b.active));
    }

    #[test]
    fn test_terminal_tick_is_frozen() {
        let tuning = Tuning::default();
        let mut table = table_for(&record(vec![far_target()], 1, 1));
        let mut events = Vec::new();
        table.launch(&tuning, &mut events);
        table.state.status = GameStatus::Lost;
        let before = table.clone();

        tick(&mut table, &tuning, SIM_DT, &mut events);
        assert_eq!(table, before);
        assert!(!table.launch(&tuning, &mut events));
    }

    #[test]
    fn test_resize_keeps_bodies() {
        let tuning = Tuning::default();
        let mut table = Table::new(
            LevelSet::builtin().record(0),
            0,
            Bounds::from_size(TABLE_WIDTH, TABLE_HEIGHT),
            &tuning,
        );
        let mut events = Vec::new();
        table.launch(&tuning, &mut events);
        let body = table.bodies[0].clone();
        let pivot = table.level.flippers[0].pivot;

        table.resize(800.0, 1200.0, &tuning);

        assert_eq!(table.bodies[0], body);
        assert!((table.level.flippers[0].pivot - pivot * 2.0).length() < 1e-9);
        assert_eq!(table.bounds.max, DVec2::new(800.0, 1200.0));
    }
}
