//! Level data: the on-disk record format, level sets and runtime levels
//!
//! A level set is an ordered JSON list of records:
//!
//! ```json
//! [
//!   {
//!     "targets": [{ "x": 200, "y": 100, "points": 100 }],
//!     "bumpers": [{ "x": 200, "y": 300, "radius": 20 }],
//!     "spawn": { "x": 200, "y": 40 },
//!     "lives": 3
//!   }
//! ]
//! ```
//!
//! Targets may also set `radius`, bumpers `impulse` and `points`, and a
//! level `balls` (bodies served per launch); tuning supplies the defaults.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::flipper::{Flipper, Side};
use super::geometry::Bounds;
use super::state::{Bumper, Target};
use crate::consts::*;
use crate::tuning::Tuning;

/// Error raised when level data cannot be loaded
#[derive(Debug, Error)]
pub enum LevelError {
    /// The JSON could not be parsed
    #[error("invalid level JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The set has no levels
    #[error("level set is empty")]
    Empty,
    /// A target or bumper has a non-positive radius
    #[error("level {level}: {item} {index} has a non-positive radius")]
    BadRadius {
        level: usize,
        item: &'static str,
        index: usize,
    },
    /// A level starts with zero lives
    #[error("level {level}: lives must be at least 1")]
    NoLives { level: usize },
    /// A level serves zero balls
    #[error("level {level}: balls must be at least 1")]
    NoBalls { level: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
}

impl From<PointRecord> for DVec2 {
    fn from(p: PointRecord) -> Self {
        DVec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub x: f64,
    pub y: f64,
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BumperRecord {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impulse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

fn one() -> u32 {
    1
}

/// One level as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    #[serde(default)]
    pub targets: Vec<TargetRecord>,
    #[serde(default)]
    pub bumpers: Vec<BumperRecord>,
    pub spawn: PointRecord,
    pub lives: u32,
    #[serde(default = "one")]
    pub balls: u32,
}

/// An ordered, non-empty list of level records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LevelSet {
    levels: Vec<LevelRecord>,
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LevelSet {
    /// Build a set from records, rejecting unusable data
    pub fn new(levels: Vec<LevelRecord>) -> Result<Self, LevelError> {
        let set = Self { levels };
        set.validate()?;
        Ok(set)
    }

    /// Parse a JSON level list
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let levels: Vec<LevelRecord> = serde_json::from_str(json)?;
        let set = Self::new(levels)?;
        log::info!("Loaded {} levels", set.len());
        Ok(set)
    }

    pub fn to_json(&self) -> String {
        // Records hold only plain numbers and lists, serialization cannot fail
        serde_json::to_string_pretty(&self.levels).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::Empty);
        }
        for (level, record) in self.levels.iter().enumerate() {
            if record.lives == 0 {
                return Err(LevelError::NoLives { level });
            }
            if record.balls == 0 {
                return Err(LevelError::NoBalls { level });
            }
            for (index, target) in record.targets.iter().enumerate() {
                if target.radius.is_some_and(|r| r <= 0.0) {
                    return Err(LevelError::BadRadius { level, item: "target", index });
                }
            }
            for (index, bumper) in record.bumpers.iter().enumerate() {
                if bumper.radius <= 0.0 {
                    return Err(LevelError::BadRadius { level, item: "bumper", index });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Out-of-range indices wrap around instead of failing
    pub fn wrap_index(&self, index: u32) -> u32 {
        (index as usize % self.levels.len()) as u32
    }

    pub fn record(&self, index: u32) -> &LevelRecord {
        &self.levels[self.wrap_index(index) as usize]
    }

    /// The stock tables, laid out for a 400 x 600 playfield
    pub fn builtin() -> Self {
        let target = |x, y, points| TargetRecord { x, y, points, radius: None };
        let bumper = |x, y, radius| BumperRecord {
            x,
            y,
            radius,
            impulse: None,
            points: None,
        };
        let spawn = PointRecord { x: 200.0, y: 60.0 };

        Self {
            levels: vec![
                LevelRecord {
                    targets: vec![
                        target(120.0, 160.0, 100),
                        target(200.0, 120.0, 100),
                        target(280.0, 160.0, 100),
                    ],
                    bumpers: vec![
                        bumper(140.0, 280.0, 22.0),
                        bumper(260.0, 280.0, 22.0),
                        bumper(200.0, 350.0, 22.0),
                    ],
                    spawn,
                    lives: DEFAULT_LIVES,
                    balls: 1,
                },
                LevelRecord {
                    targets: vec![
                        target(60.0, 120.0, 150),
                        target(140.0, 200.0, 100),
                        target(200.0, 100.0, 250),
                        target(260.0, 200.0, 100),
                        target(340.0, 120.0, 150),
                    ],
                    bumpers: vec![
                        bumper(100.0, 300.0, 18.0),
                        bumper(200.0, 250.0, 24.0),
                        bumper(300.0, 300.0, 18.0),
                        bumper(200.0, 380.0, 16.0),
                    ],
                    spawn,
                    lives: DEFAULT_LIVES,
                    balls: 1,
                },
                LevelRecord {
                    targets: vec![
                        target(50.0, 90.0, 200),
                        target(350.0, 90.0, 200),
                        target(120.0, 180.0, 100),
                        target(280.0, 180.0, 100),
                        target(80.0, 330.0, 150),
                        target(320.0, 330.0, 150),
                    ],
                    bumpers: vec![
                        bumper(200.0, 200.0, 26.0),
                        bumper(150.0, 290.0, 16.0),
                        bumper(250.0, 290.0, 16.0),
                    ],
                    spawn,
                    lives: DEFAULT_LIVES,
                    balls: 2,
                },
            ],
        }
    }

    /// A deterministic procedural set: same seed, same tables
    pub fn generated(seed: u64, count: u32, width: f64, height: f64) -> Self {
        let count = count.max(1);
        let usable = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
        let (width, height) = if usable {
            (width, height)
        } else {
            log::warn!(
                "Cannot generate for {}x{}, using the default size",
                width,
                height
            );
            (TABLE_WIDTH, TABLE_HEIGHT)
        };
        let levels = (0..count)
            .map(|index| generate_level(seed, index, width, height))
            .collect();
        Self { levels }
    }
}

/// Generate one table, scattering items over the upper part of the field
fn generate_level(seed: u64, index: u32, width: f64, height: f64) -> LevelRecord {
    let level_seed = seed.wrapping_add(u64::from(index).wrapping_mul(2654435761));
    let mut rng = Pcg32::seed_from_u64(level_seed);

    let margin = (width * 0.1).min(40.0);
    let top = height * 0.15;
    let bottom = height * 0.65;
    let mut placed: Vec<(DVec2, f64)> = Vec::new();

    // Rejection-sample a free spot; gives up (and skips the item) after a few tries
    let mut place = |rng: &mut Pcg32, radius: f64| -> Option<DVec2> {
        for _ in 0..32 {
            let p = DVec2::new(
                rng.random_range(margin..width - margin),
                rng.random_range(top..bottom),
            );
            let clear = placed
                .iter()
                .all(|&(q, r)| p.distance(q) > r + radius + BODY_RADIUS * 3.0);
            if clear {
                placed.push((p, radius));
                return Some(p);
            }
        }
        None
    };

    let bumper_count = 2 + index % 3;
    let mut bumpers = Vec::new();
    for _ in 0..bumper_count {
        let radius = rng.random_range(14.0..26.0);
        if let Some(p) = place(&mut rng, radius) {
            bumpers.push(BumperRecord {
                x: p.x,
                y: p.y,
                radius,
                impulse: None,
                points: None,
            });
        }
    }

    let target_count = 3 + index % 4;
    let mut targets = Vec::new();
    for _ in 0..target_count {
        if let Some(p) = place(&mut rng, 12.0) {
            targets.push(TargetRecord {
                x: p.x,
                y: p.y,
                points: 50 * rng.random_range(1..=5),
                radius: None,
            });
        }
    }

    log::debug!(
        "Generated level {}: {} targets, {} bumpers",
        index,
        targets.len(),
        bumpers.len()
    );

    LevelRecord {
        targets,
        bumpers,
        spawn: PointRecord {
            x: width / 2.0,
            y: height * 0.1,
        },
        lives: DEFAULT_LIVES,
        balls: if index % 5 == 4 { 2 } else { 1 },
    }
}

/// A level in play: the record's contents plus live target and flipper state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub index: u32,
    pub targets: Vec<Target>,
    pub bumpers: Vec<Bumper>,
    /// Indexed by `Side` (left, right)
    pub flippers: [Flipper; 2],
    pub spawn: DVec2,
    pub lives: u32,
    pub balls: u32,
}

impl Level {
    /// Build a fresh level from its record
    pub fn build(record: &LevelRecord, index: u32, bounds: &Bounds, tuning: &Tuning) -> Self {
        let targets = record
            .targets
            .iter()
            .map(|t| {
                Target::new(
                    DVec2::new(t.x, t.y),
                    t.radius.unwrap_or(tuning.target_radius),
                    t.points,
                )
            })
            .collect();
        let bumpers = record
            .bumpers
            .iter()
            .map(|b| Bumper {
                pos: DVec2::new(b.x, b.y),
                radius: b.radius,
                impulse: b.impulse.unwrap_or(tuning.bumper_impulse),
                points: b.points.unwrap_or(tuning.bumper_points),
            })
            .collect();

        Self {
            index,
            targets,
            bumpers,
            flippers: [
                Flipper::new(Side::Left, bounds, tuning),
                Flipper::new(Side::Right, bounds, tuning),
            ],
            spawn: record.spawn.into(),
            lives: record.lives,
            balls: record.balls,
        }
    }

    pub fn flipper_mut(&mut self, side: Side) -> &mut Flipper {
        match side {
            Side::Left => &mut self.flippers[0],
            Side::Right => &mut self.flippers[1],
        }
    }

    /// Spawn slot for body `id`; multi-ball spreads bodies sideways
    pub fn serve_position(&self, id: u32, radius: f64) -> DVec2 {
        let spread = f64::from(id) - f64::from(self.balls.saturating_sub(1)) / 2.0;
        self.spawn + DVec2::new(spread * 2.5 * radius, 0.0)
    }

    /// A level without targets can't be won
    pub fn all_targets_hit(&self) -> bool {
        !self.targets.is_empty() && self.targets.iter().all(|t| t.hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_LEVEL: &str = r#"[
        {
            "targets": [{ "x": 200, "y": 100, "points": 100 }],
            "bumpers": [{ "x": 200, "y": 300, "radius": 20, "points": 5 }],
            "spawn": { "x": 200, "y": 40 },
            "lives": 2
        }
    ]"#;

    #[test]
    fn test_parse_level_json() {
        let set = LevelSet::from_json(ONE_LEVEL).unwrap();
        assert_eq!(set.len(), 1);
        let record = set.record(0);
        assert_eq!(record.lives, 2);
        assert_eq!(record.balls, 1);
        assert_eq!(record.targets[0].radius, None);
        assert_eq!(record.bumpers[0].points, Some(5));
    }

    #[test]
    fn test_index_wraps() {
        let set = LevelSet::builtin();
        assert_eq!(set.len(), 3);
        assert_eq!(set.wrap_index(0), 0);
        assert_eq!(set.wrap_index(4), 1);
        assert_eq!(set.wrap_index(u32::MAX), u32::MAX % 3);
        assert_eq!(set.record(3), set.record(0));
    }

    #[test]
    fn test_rejects_bad_data() {
        assert!(matches!(LevelSet::from_json("[]"), Err(LevelError::Empty)));
        assert!(matches!(LevelSet::from_json("{"), Err(LevelError::Parse(_))));

        let zero_lives = r#"[{ "spawn": { "x": 0, "y": 0 }, "lives": 0 }]"#;
        assert!(matches!(
            LevelSet::from_json(zero_lives),
            Err(LevelError::NoLives { level: 0 })
        ));

        let bad_bumper = r#"[{
            "bumpers": [{ "x": 1, "y": 1, "radius": 0 }],
            "spawn": { "x": 0, "y": 0 },
            "lives": 1
        }]"#;
        assert!(matches!(
            LevelSet::from_json(bad_bumper),
            Err(LevelError::BadRadius { item: "bumper", index: 0, .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = LevelSet::from_json("[]").unwrap_err();
        assert_eq!(err.to_string(), "level set is empty");

        let err = LevelSet::from_json("{").unwrap_err();
        assert!(err.to_string().starts_with("invalid level JSON"));
        assert!(std::error::Error::source(&err).is_some());

        let no_balls = r#"[{ "spawn": { "x": 0, "y": 0 }, "lives": 1, "balls": 0 }]"#;
        let err = LevelSet::from_json(no_balls).unwrap_err();
        assert_eq!(err.to_string(), "level 0: balls must be at least 1");
    }

    #[test]
    fn test_generated_falls_back_on_unusable_size() {
        let fallback = LevelSet::generated(1, 2, TABLE_WIDTH, TABLE_HEIGHT);
        assert_eq!(LevelSet::generated(1, 2, f64::INFINITY, 600.0), fallback);
        assert_eq!(LevelSet::generated(1, 2, 400.0, f64::NAN), fallback);
        assert_eq!(LevelSet::generated(1, 2, -5.0, 600.0), fallback);
    }

    #[test]
    fn test_builtin_round_trips_through_json() {
        let set = LevelSet::builtin();
        let reloaded = LevelSet::from_json(&set.to_json()).unwrap();
        assert_eq!(set, reloaded);
    }

    #[test]
    fn test_build_applies_tuning_defaults() {
        let set = LevelSet::from_json(ONE_LEVEL).unwrap();
        let tuning = Tuning::default();
        let bounds = Bounds::from_size(TABLE_WIDTH, TABLE_HEIGHT);
        let level = Level::build(set.record(0), 0, &bounds, &tuning);
        assert_eq!(level.targets[0].radius, tuning.target_radius);
        assert!(!level.targets[0].hit);
        assert_eq!(level.bumpers[0].impulse, tuning.bumper_impulse);
        assert_eq!(level.bumpers[0].points, 5);
        assert_eq!(level.spawn, DVec2::new(200.0, 40.0));
        assert_eq!(level.flippers[0].side, Side::Left);
        assert_eq!(level.flippers[1].side, Side::Right);
    }

    #[test]
    fn test_generated_is_deterministic() {
        let a = LevelSet::generated(42, 6, TABLE_WIDTH, TABLE_HEIGHT);
        let b = LevelSet::generated(42, 6, TABLE_WIDTH, TABLE_HEIGHT);
        let c = LevelSet::generated(43, 6, TABLE_WIDTH, TABLE_HEIGHT);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 6);
        assert!(a.validate().is_ok());
        for index in 0..6 {
            let record = a.record(index);
            assert!(!record.targets.is_empty());
            for t in &record.targets {
                assert!(t.x > 0.0 && t.x < TABLE_WIDTH && t.y > 0.0 && t.y < TABLE_HEIGHT);
            }
        }
    }

    #[test]
    fn test_empty_target_list_never_wins() {
        let bounds = Bounds::from_size(TABLE_WIDTH, TABLE_HEIGHT);
        let record = LevelRecord {
            targets: Vec::new(),
            bumpers: Vec::new(),
            spawn: PointRecord { x: 0.0, y: 0.0 },
            lives: 1,
            balls: 1,
        };
        let level = Level::build(&record, 0, &bounds, &Tuning::default());
        assert!(!level.all_targets_hit());
    }
}
