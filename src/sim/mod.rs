//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep by default
//! - Seeded RNG only (procedural levels)
//! - Stable iteration order (by index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod flipper;
pub mod geometry;
pub mod integrate;
pub mod level;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{RESOLUTION_ORDER, Stage, resolve};
pub use flipper::{Flipper, Side, ease};
pub use geometry::{Bounds, Circle, Contact, Segment};
pub use integrate::integrate;
pub use level::{Level, LevelError, LevelRecord, LevelSet};
pub use session::Session;
pub use snapshot::{FlipperView, Snapshot};
pub use state::{Body, Bumper, GameEvent, GameState, GameStatus, Target};
pub use tick::{Table, tick};
