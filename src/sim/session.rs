//! Simulation loop
//!
//! `Session` owns the level set, the live table and the timestep
//! accumulator. Callers drive it from an external tick source through a
//! narrow input surface and only ever read back snapshots.

use super::flipper::Side;
use super::geometry::Bounds;
use super::level::LevelSet;
use super::snapshot::Snapshot;
use super::state::{GameEvent, GameState, GameStatus};
use super::tick::{Table, tick};
use crate::consts::*;
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct Session {
    levels: LevelSet,
    tuning: Tuning,
    table: Table,
    accumulator: f64,
    running: bool,
    /// Launch requested while stopped, applied on resume
    pending_launch: bool,
    /// Events since the last snapshot
    events: Vec<GameEvent>,
    snapshot: Snapshot,
}

impl Session {
    /// A running session on level 0 of `levels`, in `Waiting`
    pub fn new(levels: LevelSet, tuning: Tuning) -> Self {
        let bounds = Bounds::from_size(TABLE_WIDTH, TABLE_HEIGHT);
        let table = Table::new(levels.record(0), 0, bounds, &tuning);
        let snapshot = Snapshot::capture(&table, tuning.flipper_thickness, Vec::new());
        Self {
            levels,
            tuning,
            table,
            accumulator: 0.0,
            running: true,
            pending_launch: false,
            events: Vec::new(),
            snapshot,
        }
    }

    /// (Re)load a level with fresh score and lives; the index wraps
    pub fn start(&mut self, level_index: u32) {
        let index = self.levels.wrap_index(level_index);
        if index != level_index {
            log::debug!("Level index {} wrapped to {}", level_index, index);
        }
        self.table = Table::new(self.levels.record(index), index, self.table.bounds, &self.tuning);
        self.accumulator = 0.0;
        self.pending_launch = false;
        self.events.clear();
        log::info!(
            "Level {} started ({} targets, {} lives)",
            index,
            self.table.level.targets.len(),
            self.table.state.lives
        );
        self.refresh();
    }

    /// Serve the ball. Ignored while a ball is in play or the level is over.
    pub fn launch(&mut self) {
        if !self.running {
            self.pending_launch = true;
            return;
        }
        self.table.launch(&self.tuning, &mut self.events);
    }

    pub fn set_flipper(&mut self, side: Side, pressed: bool) {
        self.table.level.flipper_mut(side).set_pressed(pressed);
    }

    /// Rescale the walls and flippers to a new table size
    pub fn resize(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.table.resize(width, height, &self.tuning);
        self.refresh();
    }

    /// Feed one frame delta from the tick source
    ///
    /// With `fixed_timestep` the delta fills an accumulator drained in
    /// `SIM_DT` steps (at most `max_substeps`); otherwise exactly one step of
    /// the clamped delta runs. Stopped sessions ignore the call.
    pub fn update(&mut self, dt: f64) -> &Snapshot {
        if !self.running {
            return &self.snapshot;
        }

        let dt = if dt.is_finite() && dt > 0.0 {
            dt.min(self.tuning.dt_max)
        } else {
            0.0
        };

        if self.tuning.fixed_timestep {
            self.accumulator += dt;
            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < self.tuning.max_substeps {
                tick(&mut self.table, &self.tuning, SIM_DT, &mut self.events);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
            if substeps == self.tuning.max_substeps && self.accumulator >= SIM_DT {
                log::debug!("Dropping {:.4}s of backlog", self.accumulator);
                self.accumulator = 0.0;
            }
        } else if dt > 0.0 {
            tick(&mut self.table, &self.tuning, dt, &mut self.events);
        }

        self.refresh();
        &self.snapshot
    }

    /// Advance exactly one fixed step, ignoring the accumulator
    pub fn step(&mut self) -> &Snapshot {
        if self.running {
            tick(&mut self.table, &self.tuning, SIM_DT, &mut self.events);
            self.refresh();
        }
        &self.snapshot
    }

    /// Halt simulation; later updates do nothing until `resume`
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.accumulator = 0.0;
        log::debug!("Session stopped");
    }

    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        log::debug!("Session resumed");
        if self.pending_launch {
            self.pending_launch = false;
            self.table.launch(&self.tuning, &mut self.events);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &GameState {
        &self.table.state
    }

    pub fn status(&self) -> GameStatus {
        self.table.state.status
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    fn refresh(&mut self) {
        let events = std::mem::take(&mut self.events);
        self.snapshot = Snapshot::capture(&self.table, self.tuning.flipper_thickness, events);
    }

    #[cfg(test)]
    pub(crate) fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }
}
