//! Reference arcade physics
//!
//! A minimal stand-in for the host engine: gravity, separate-axis AABB
//! resolution against segments and live obstacles, world bounds, and a
//! fixed-length attack animation. Produces the `PhysicsReport` the tick
//! consumes, so the core can run headless.

use glam::Vec2;

use super::collision::Aabb;
use super::player::BodySample;
use super::state::GameState;
use super::tick::PhysicsReport;

/// Attack animation length: 4 frames at 12 fps
pub const ATTACK_ANIMATION_MS: f64 = 4.0 * 1000.0 / 12.0;

/// Shrink applied to the non-moving axis so resting contact isn't a side hit
const SKIN: f32 = 1.0;

/// Body and animation state owned by the integrator
#[derive(Debug, Clone)]
pub struct ArcadeWorld {
    pos: Vec2,
    vel: Vec2,
    size: Vec2,
    grounded: bool,
    active: bool,
    attack_elapsed_ms: Option<f64>,
}

impl ArcadeWorld {
    /// Body matching the player's spawn in `state`
    pub fn new(state: &GameState) -> Self {
        Self {
            pos: state.player.pos,
            vel: Vec2::ZERO,
            size: state.player.size,
            grounded: state.player.grounded,
            active: true,
            attack_elapsed_ms: None,
        }
    }

    pub fn body(&self) -> BodySample {
        BodySample {
            pos: self.pos,
            vel: self.vel,
            grounded: self.grounded,
            active: self.active,
        }
    }

    /// Remove the body, as if the engine destroyed the sprite
    pub fn destroy(&mut self) {
        self.active = false;
    }

    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    /// Integrate one step using the velocity the last tick commanded
    pub fn step(&mut self, state: &GameState, dt_ms: f32) -> PhysicsReport {
        let mut report = PhysicsReport::default();
        if !self.active {
            report.body = Some(self.body());
            return report;
        }

        let tuning = &state.tuning;
        let dt = dt_ms.max(0.0) / 1000.0;

        self.vel = state.player.vel;
        self.vel.y += tuning.gravity * dt;

        let solids: Vec<(Aabb, Option<u32>)> = state
            .segments
            .iter()
            .map(|s| (s.bounds(), None))
            .chain(
                state
                    .obstacles
                    .iter()
                    .filter(|o| o.is_alive())
                    .map(|o| (o.hitbox(), Some(o.id))),
            )
            .collect();

        // Horizontal pass
        self.pos.x += self.vel.x * dt;
        for (solid, obstacle) in &solids {
            let mut probe = self.bounds();
            probe.half.y -= SKIN;
            if !probe.intersects(solid) {
                continue;
            }
            if self.vel.x > 0.0 {
                self.pos.x = solid.left() - self.size.x / 2.0;
            } else if self.vel.x < 0.0 {
                self.pos.x = solid.right() + self.size.x / 2.0;
            }
            self.vel.x = 0.0;
            if let Some(id) = obstacle {
                push_unique(&mut report.obstacle_contacts, *id);
            }
        }

        // Vertical pass
        self.pos.y += self.vel.y * dt;
        self.grounded = false;
        for (solid, obstacle) in &solids {
            let mut probe = self.bounds();
            probe.half.x -= SKIN;
            if !probe.intersects(solid) {
                continue;
            }
            if self.vel.y > 0.0 {
                self.pos.y = solid.top() - self.size.y / 2.0;
                self.grounded = true;
            } else if self.vel.y < 0.0 {
                self.pos.y = solid.bottom() + self.size.y / 2.0;
            }
            self.vel.y = 0.0;
            if let Some(id) = obstacle {
                push_unique(&mut report.obstacle_contacts, *id);
            }
        }

        // World bounds
        let half = self.size / 2.0;
        self.pos.x = self.pos.x.clamp(half.x, (tuning.world_width - half.x).max(half.x));
        if self.pos.y + half.y > tuning.world_bottom() {
            self.pos.y = tuning.world_bottom() - half.y;
            self.vel.y = 0.0;
        }

        let body = self.bounds();
        report.powerup_overlaps = state
            .powerups
            .iter()
            .filter(|p| !p.collected && p.bounds().intersects(&body))
            .map(|p| p.id)
            .collect();

        if state.player.attacking {
            let elapsed = self.attack_elapsed_ms.unwrap_or(0.0) + f64::from(dt_ms.max(0.0));
            if elapsed >= ATTACK_ANIMATION_MS {
                report.attack_animation_complete = true;
                self.attack_elapsed_ms = None;
            } else {
                self.attack_elapsed_ms = Some(elapsed);
            }
        } else {
            self.attack_elapsed_ms = None;
        }

        report.body = Some(self.body());
        report
    }
}

fn push_unique(ids: &mut Vec<u32>, id: u32) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
