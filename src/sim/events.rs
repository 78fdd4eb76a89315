//! Effects emitted by a simulation tick
//!
//! The host engine turns these into sprites, sounds, tweens, and scene
//! changes. The core never talks to the engine directly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::economy::FinalScore;
use crate::handoff::Handoff;

/// Animation the player sprite should be showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Animation {
    #[default]
    Idle,
    Walk,
    Run,
    Attack,
}

/// One thing that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SegmentSpawned { id: u32, bounds: Aabb },
    SegmentRetired { id: u32 },
    ObstacleSpawned { id: u32, pos: Vec2 },
    /// Obstacle knocked out; its collision is already disabled
    ObstacleDefeated { id: u32, points: u64 },
    ObstacleRemoved { id: u32 },
    PowerupSpawned { id: u32, pos: Vec2 },
    PowerupCollected { id: u32, charges: u32 },
    PowerupRemoved { id: u32 },
    /// One power-up charge ran out
    ChargeExpired { remaining: u32 },
    SuperstarStarted,
    SuperstarEnded,
    Jumped { mid_air: bool },
    AttackStarted { hitbox: Aabb },
    AttackFinished,
    AnimationChanged(Animation),
    ScorePopup { id: u32, pos: Vec2, text: String },
    PopupExpired { id: u32 },
    LifeLost { lives_left: u32 },
    /// A life was lost with lives remaining; restart from this carry-over
    RunRestarting(Handoff),
    /// The run is over
    RunFinished { score: FinalScore, won: bool },
}
