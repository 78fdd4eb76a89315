//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep, no wall clock
//! - Seeded RNG only
//! - Deferred effects through the delay queue, never engine timers
//! - No rendering or platform dependencies

pub mod arcade;
pub mod autopilot;
pub mod collision;
pub mod economy;
pub mod events;
pub mod input;
pub mod player;
pub mod state;
pub mod tick;
pub mod timers;
pub mod track;

pub use arcade::ArcadeWorld;
pub use autopilot::autopilot_intents;
pub use collision::{Aabb, attack_hitbox};
pub use economy::{FinalScore, LifeOutcome, RunEconomy, ScoreChange};
pub use events::{Animation, GameEvent};
pub use input::{DragDirection, InputTracker, Intents, Key, RawInput};
pub use player::{BodySample, PlayerMode, PlayerRunState, select_speed};
pub use state::{GameState, Obstacle, ObstacleState, Powerup, RunPhase, ScorePopup, TrackSegment};
pub use tick::{PhysicsReport, TickInput, tick};
pub use timers::{DeferredEffect, DelayQueue};
pub use track::{Placement, TrackGenerator, max_jump_distance, min_gap, safe_max_gap};
