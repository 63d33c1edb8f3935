//! High score leaderboard
//!
//! The simulation only reports scores; this board keeps the best ten and
//! persists them through whatever key/value store the host provides
//! (LocalStorage in the browser).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Host-provided string storage
pub trait ScoreStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store (native runs and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, value).is_err() {
                log::warn!("LocalStorage rejected write to {}", key);
            }
        }
    }
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level the score was made on
    pub level: u32,
}

/// High score leaderboard, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "table_sim_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        self.entries.len() < MAX_HIGH_SCORES
            || self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would get (1-indexed), if it qualifies
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a score; returns the rank achieved (1-indexed)
    pub fn add_score(&mut self, score: u64, level: u32) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(rank - 1, HighScoreEntry { score, level });
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Best score made on one level
    pub fn best_for_level(&self, level: u32) -> Option<u64> {
        self.entries
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.score)
            .max()
    }

    /// Load from a store; missing or corrupt data yields an empty board
    pub fn load(store: &dyn ScoreStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            log::info!("No high scores found, starting fresh");
            return Self::new();
        };
        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut scores) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(err) => {
                log::warn!("Discarding unreadable high scores: {}", err);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn ScoreStore) {
        match serde_json::to_string(self) {
            Ok(json) => {
                store.set(Self::STORAGE_KEY, &json);
                log::info!("High scores saved ({} entries)", self.entries.len());
            }
            Err(err) => log::warn!("Could not encode high scores: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        assert!(!HighScores::new().qualifies(0));
        assert_eq!(HighScores::new().add_score(0, 0), None);
    }

    #[test]
    fn test_scores_sorted_and_ranked() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(300, 0), Some(1));
        assert_eq!(scores.add_score(500, 1), Some(1));
        assert_eq!(scores.add_score(400, 0), Some(2));
        assert_eq!(scores.add_score(100, 2), Some(4));
        let list: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(list, vec![500, 400, 300, 100]);
        assert_eq!(scores.top_score(), Some(500));
        assert_eq!(scores.best_for_level(0), Some(400));
        assert_eq!(scores.best_for_level(9), None);
    }

    #[test]
    fn test_board_is_capped() {
        let mut scores = HighScores::new();
        for n in 1..=MAX_HIGH_SCORES as u64 {
            scores.add_score(n * 10, 0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert!(!scores.qualifies(10));
        assert_eq!(scores.potential_rank(15), Some(MAX_HIGH_SCORES));
        assert_eq!(scores.add_score(1000, 0), Some(1));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(20));
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = MemoryStore::default();
        assert!(HighScores::load(&store).is_empty());

        let mut scores = HighScores::new();
        scores.add_score(250, 2);
        scores.save(&mut store);

        assert_eq!(HighScores::load(&store), scores);
    }

    #[test]
    fn test_corrupt_store_is_empty() {
        let mut store = MemoryStore::default();
        store.set(HighScores::STORAGE_KEY, "{ not json");
        assert!(HighScores::load(&store).is_empty());
    }
}
