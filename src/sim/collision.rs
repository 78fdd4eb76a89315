//! Axis-aligned box geometry
//!
//! The host engine owns broad-phase collision. The core only needs boxes
//! for its own attack sweep, for the reference arcade integrator, and for
//! answering "is this entity behind the camera" queries.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    /// Build from the top-left corner and size
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min + size * 0.5, size)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.half * 2.0
    }

    /// Overlap test; touching edges do not count
    pub fn intersects(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        d.x < self.half.x + other.half.x && d.y < self.half.y + other.half.y
    }
}

/// Horizontal gap between the attacker's right edge and the hitbox
pub const ATTACK_OFFSET_X: f32 = 5.0;
/// Attack hitbox width
pub const ATTACK_WIDTH: f32 = 30.0;
/// Attack hitbox height as a fraction of the player's height
pub const ATTACK_HEIGHT_FACTOR: f32 = 0.8;

/// Hitbox swept in front of a player body when an attack starts
pub fn attack_hitbox(player: &Aabb) -> Aabb {
    let height = player.size().y * ATTACK_HEIGHT_FACTOR;
    Aabb::from_min_size(
        Vec2::new(player.right() + ATTACK_OFFSET_X, player.center.y - height / 2.0),
        Vec2::new(ATTACK_WIDTH, height),
    )
}
