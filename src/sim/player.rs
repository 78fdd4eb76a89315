//! Player state machine
//!
//! Grounded, Airborne, and Attacking, derived from the body contact the
//! physics layer reports plus the attack flag. Jumps go through a short
//! buffer so a press just before landing still counts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::events::Animation;
use crate::tuning::Tuning;

/// Coarse player mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerMode {
    Grounded,
    Airborne,
    Attacking,
}

/// Body state reported by the physics layer for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySample {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Standing on something this tick
    pub grounded: bool,
    /// False once the engine destroyed the player entity
    pub active: bool,
}

/// Horizontal speed for this tick
pub fn select_speed(powered: bool, run_held: bool, tuning: &Tuning) -> f32 {
    if powered {
        tuning.powerup_run_speed
    } else if run_held {
        tuning.run_speed
    } else {
        tuning.walk_speed
    }
}

/// Everything the core tracks about the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRunState {
    pub pos: Vec2,
    /// Commanded velocity after a tick; the physics layer applies it
    pub vel: Vec2,
    pub size: Vec2,
    pub grounded: bool,
    /// When contact with the ground was lost
    pub airborne_since_ms: Option<f64>,
    pub attacking: bool,
    /// Active power-up charges, each allowing one mid-air jump
    pub charges: u32,
    pub mid_air_jumps_used: u32,
    /// When the last jump intent was registered
    pub jump_buffer_at_ms: Option<f64>,
    pub animation: Animation,
}

impl PlayerRunState {
    /// Standing on ground level at the spawn point
    pub fn spawn(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(tuning.player_spawn_x(), tuning.player_spawn_y()),
            vel: Vec2::ZERO,
            size: Vec2::new(tuning.player_width, tuning.player_height),
            grounded: true,
            airborne_since_ms: None,
            attacking: false,
            charges: 0,
            mid_air_jumps_used: 0,
            jump_buffer_at_ms: None,
            animation: Animation::Idle,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn mode(&self) -> PlayerMode {
        if self.attacking {
            PlayerMode::Attacking
        } else if self.grounded {
            PlayerMode::Grounded
        } else {
            PlayerMode::Airborne
        }
    }

    /// Adopt the body state from physics; landing resets mid-air jumps
    pub fn sync_body(&mut self, body: &BodySample, now_ms: f64) {
        self.pos = body.pos;
        self.vel = body.vel;
        self.grounded = body.grounded;
        if body.grounded {
            self.airborne_since_ms = None;
            self.mid_air_jumps_used = 0;
        } else if self.airborne_since_ms.is_none() {
            self.airborne_since_ms = Some(now_ms);
        }
    }

    /// Register a jump intent
    pub fn buffer_jump(&mut self, now_ms: f64) {
        self.jump_buffer_at_ms = Some(now_ms);
    }

    /// A jump registered at T is live for T <= now < T + buffer
    pub fn jump_buffered(&self, now_ms: f64, tuning: &Tuning) -> bool {
        self.jump_buffer_at_ms
            .is_some_and(|at| now_ms >= at && now_ms - at < tuning.jump_buffer_ms)
    }

    /// Mid-air jumps still available
    pub fn mid_air_jumps_left(&self) -> u32 {
        self.charges.saturating_sub(self.mid_air_jumps_used)
    }

    /// Honor a buffered jump if allowed; returns `Some(mid_air)` on a jump
    pub fn try_jump(&mut self, now_ms: f64, tuning: &Tuning) -> Option<bool> {
        if self.attacking || !self.jump_buffered(now_ms, tuning) {
            return None;
        }

        let mid_air = !self.grounded;
        if mid_air {
            let rising_fast = self.vel.y < -tuning.multi_jump_rise_threshold;
            if self.mid_air_jumps_left() == 0 || rising_fast {
                return None;
            }
            self.mid_air_jumps_used += 1;
        }

        self.vel.y = -tuning.jump_velocity.abs();
        self.jump_buffer_at_ms = None;
        log::trace!(
            "Jump ({}), {} mid-air jumps left",
            if mid_air { "mid-air" } else { "ground" },
            self.mid_air_jumps_left()
        );
        Some(mid_air)
    }

    /// Enter Attacking; horizontal motion stops until it finishes
    pub fn try_begin_attack(&mut self) -> bool {
        if self.attacking {
            return false;
        }
        self.attacking = true;
        self.vel.x = 0.0;
        self.animation = Animation::Attack;
        true
    }

    /// Leave Attacking once the animation completes
    pub fn finish_attack(&mut self) -> bool {
        std::mem::replace(&mut self.attacking, false)
    }

    /// Set horizontal speed and pick the matching animation.
    /// Returns the new animation if it changed.
    pub fn update_locomotion(
        &mut self,
        speed: f32,
        running: bool,
        now_ms: f64,
        tuning: &Tuning,
    ) -> Option<Animation> {
        if self.attacking {
            return None;
        }
        self.vel.x = speed;

        let target = if self.grounded {
            if speed <= 0.0 {
                Animation::Idle
            } else if running {
                Animation::Run
            } else {
                Animation::Walk
            }
        } else {
            let airborne_for = self.airborne_since_ms.map_or(0.0, |since| now_ms - since);
            if airborne_for > tuning.coyote_time_ms {
                Animation::Idle
            } else {
                // Brief loss of contact keeps the current cycle
                return None;
            }
        };

        if target == self.animation {
            None
        } else {
            self.animation = target;
            Some(target)
        }
    }

    /// Drop charges and jump state (life lost)
    pub fn reset_transient(&mut self) {
        self.charges = 0;
        self.mid_air_jumps_used = 0;
        self.jump_buffer_at_ms = None;
        self.attacking = false;
    }
}
