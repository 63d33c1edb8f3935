//! Browser binding
//!
//! The page owns the canvas and the animation-frame loop; it feeds frame
//! deltas and key state in here and draws whatever snapshot comes back.

use wasm_bindgen::prelude::*;

use crate::consts::*;
use crate::highscores::{HighScores, LocalStorageStore};
use crate::sim::{GameStatus, LevelSet, Session, Side};
use crate::tuning::Tuning;

fn init_logging() {
    console_error_panic_hook::set_once();
    // Second init fails when several tables share a page; the logger is
    // already installed then.
    let _ = console_log::init_with_level(log::Level::Info);
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebTable {
    session: Session,
    /// Set once the current level's score has been offered to the board
    score_recorded: bool,
}

#[wasm_bindgen]
impl WebTable {
    /// Create a table from a levels JSON document, or the built-in set
    #[wasm_bindgen(constructor)]
    pub fn new(levels_json: Option<String>) -> Result<WebTable, JsValue> {
        init_logging();
        let levels = match levels_json {
            Some(json) => LevelSet::from_json(&json).map_err(js_error)?,
            None => LevelSet::builtin(),
        };
        log::info!("Table ready with {} levels", levels.len());
        Ok(Self::with_levels(levels, Tuning::default()))
    }

    /// Create a table with custom tuning on top of the given levels
    #[wasm_bindgen(js_name = withTuning)]
    pub fn with_tuning(
        levels_json: Option<String>,
        tuning_json: &str,
    ) -> Result<WebTable, JsValue> {
        init_logging();
        let levels = match levels_json {
            Some(json) => LevelSet::from_json(&json).map_err(js_error)?,
            None => LevelSet::builtin(),
        };
        let tuning = Tuning::from_json(tuning_json).map_err(js_error)?;
        Ok(Self::with_levels(levels, tuning))
    }

    /// Create a table on a procedurally generated set, seeded from the clock
    pub fn generated(count: u32) -> WebTable {
        init_logging();
        let seed = js_sys::Date::now() as u64;
        log::info!("Generating {} levels with seed {}", count, seed);
        let levels = LevelSet::generated(seed, count.max(1), TABLE_WIDTH, TABLE_HEIGHT);
        Self::with_levels(levels, Tuning::default())
    }

    pub fn start(&mut self, level_index: u32) {
        self.session.start(level_index);
        self.score_recorded = false;
    }

    pub fn launch(&mut self) {
        self.session.launch();
    }

    #[wasm_bindgen(js_name = setFlipper)]
    pub fn set_flipper(&mut self, left: bool, pressed: bool) {
        let side = if left { Side::Left } else { Side::Right };
        self.session.set_flipper(side, pressed);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(width, height);
    }

    /// Advance by a frame delta in seconds; returns the snapshot as JSON
    pub fn update(&mut self, dt: f64) -> String {
        let json = self.session.update(dt).to_json();
        self.record_if_over();
        json
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn resume(&mut self) {
        self.session.resume();
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> String {
        self.session.snapshot().to_json()
    }

    #[wasm_bindgen(js_name = levelCount)]
    pub fn level_count(&self) -> u32 {
        self.session.levels().len() as u32
    }

    /// Stored leaderboard as JSON
    #[wasm_bindgen(js_name = highScoresJson)]
    pub fn high_scores_json(&self) -> String {
        let scores = HighScores::load(&LocalStorageStore);
        serde_json::to_string(&scores).unwrap_or_default()
    }

    /// Best stored score on any level
    #[wasm_bindgen(js_name = bestScore)]
    pub fn best_score(&self) -> Option<f64> {
        HighScores::load(&LocalStorageStore)
            .top_score()
            .map(|s| s as f64)
    }

    /// Best stored score on the level currently loaded
    #[wasm_bindgen(js_name = levelBestScore)]
    pub fn level_best_score(&self) -> Option<f64> {
        HighScores::load(&LocalStorageStore)
            .best_for_level(self.session.state().level_index)
            .map(|s| s as f64)
    }
}

impl WebTable {
    fn with_levels(levels: LevelSet, tuning: Tuning) -> Self {
        Self {
            session: Session::new(levels, tuning),
            score_recorded: false,
        }
    }

    /// Offer a finished level's score to the stored leaderboard once
    fn record_if_over(&mut self) {
        if self.score_recorded || !self.session.status().is_terminal() {
            return;
        }
        self.score_recorded = true;

        let state = self.session.state();
        let mut store = LocalStorageStore;
        let mut scores = HighScores::load(&store);
        if let Some(rank) = scores.add_score(state.score, state.level_index) {
            log::info!(
                "New high score {} (rank {}, {})",
                state.score,
                rank,
                if state.status == GameStatus::Won { "won" } else { "lost" }
            );
            scores.save(&mut store);
        }
    }
}
