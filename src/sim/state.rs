//! Game state and core simulation types
//!
//! One `GameState` is one run: a fresh track, a fresh player, and the
//! economy carried over from the previous run through the handoff.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, attack_hitbox};
use super::economy::{FinalScore, LifeOutcome, RunEconomy};
use super::events::GameEvent;
use super::player::PlayerRunState;
use super::timers::{DeferredEffect, DelayQueue};
use super::track::{Placement, TrackGenerator, retire_behind};
use crate::handoff::Handoff;
use crate::tuning::Tuning;

/// A platform the player can stand on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSegment {
    pub id: u32,
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
}

impl TrackSegment {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.center, Vec2::new(self.width, self.height))
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.center.x - self.width / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.center.x + self.width / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y - self.height / 2.0
    }
}

/// Obstacle lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleState {
    Alive,
    /// Knocked out; collision is off and removal is scheduled
    Defeated { at_ms: f64 },
}

/// A goose standing on, or hovering over, a segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Sprite center
    pub pos: Vec2,
    /// Sprite edge length
    pub size: f32,
    pub state: ObstacleState,
}

impl Obstacle {
    /// Collision box: 80% of the sprite width, the lower half of its height
    pub fn hitbox(&self) -> Aabb {
        let size = Vec2::new(self.size * 0.8, self.size * 0.5);
        Aabb::new(Vec2::new(self.pos.x, self.pos.y + self.size * 0.25), size)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state == ObstacleState::Alive
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size / 2.0
    }
}

/// A collectible granting one mid-air jump charge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub collected: bool,
}

impl Powerup {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(self.size))
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size / 2.0
    }
}

/// Floating "+200" text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePopup {
    pub id: u32,
    pub pos: Vec2,
    pub text: String,
}

/// Where the run stands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunPhase {
    Running,
    /// Life lost with lives remaining; the director restarts from this
    Restarting(Handoff),
    /// Time ran out, lives ran out, or the player entity vanished
    Finished { score: FinalScore, won: bool },
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Seed of this run's track
    pub seed: u64,
    /// Simulation clock
    pub now_ms: f64,
    pub phase: RunPhase,
    pub player: PlayerRunState,
    pub economy: RunEconomy,
    pub track: TrackGenerator,
    /// Sorted by X; never overlapping
    pub segments: Vec<TrackSegment>,
    pub obstacles: Vec<Obstacle>,
    pub powerups: Vec<Powerup>,
    pub popups: Vec<ScorePopup>,
    pub delays: DelayQueue,
    /// Superstar window end, if one is open
    pub superstar_until_ms: Option<f64>,
    pub camera_scroll_x: f32,
    next_id: u32,
}

impl GameState {
    /// Start a run from carried-over values, laying the initial ground
    pub fn new(tuning: Tuning, seed: u64, handoff: &Handoff) -> Self {
        let player = PlayerRunState::spawn(&tuning);
        let economy = RunEconomy::from_handoff(handoff, player.pos.x, 0.0);
        let mut state = Self {
            track: TrackGenerator::new(seed, &tuning),
            tuning,
            seed,
            now_ms: 0.0,
            phase: RunPhase::Running,
            player,
            economy,
            segments: Vec::new(),
            obstacles: Vec::new(),
            powerups: Vec::new(),
            popups: Vec::new(),
            delays: DelayQueue::new(),
            superstar_until_ms: None,
            camera_scroll_x: 0.0,
            next_id: 1,
        };

        let placements = state.track.lay_ground(&state.tuning);
        let mut events = Vec::new();
        state.apply_placements(placements, &mut events);

        log::info!(
            "Run started: seed={} lives={} score={} time_left={:.0}ms max_distance={:.0}",
            seed,
            handoff.lives,
            handoff.score,
            handoff.time_left_ms,
            handoff.max_distance
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Superstar window is open
    pub fn is_powered(&self) -> bool {
        self.superstar_until_ms.is_some_and(|until| self.now_ms < until)
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Camera scroll that keeps the player `camera_lead` px from the left edge
    pub fn follow_camera(&self) -> f32 {
        let max_scroll = (self.tuning.world_width - self.tuning.viewport_width).max(0.0);
        (self.player.pos.x - self.tuning.camera_lead).clamp(0.0, max_scroll)
    }

    pub fn obstacle(&self, id: u32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn powerup(&self, id: u32) -> Option<&Powerup> {
        self.powerups.iter().find(|p| p.id == id)
    }

    /// Turn generator output into entities
    pub(crate) fn apply_placements(&mut self, placements: Vec<Placement>, events: &mut Vec<GameEvent>) {
        for placement in placements {
            let id = self.next_entity_id();
            let segment = TrackSegment {
                id,
                center: placement.center,
                width: placement.width,
                height: self.tuning.segment_height,
            };
            events.push(GameEvent::SegmentSpawned {
                id,
                bounds: segment.bounds(),
            });
            self.segments.push(segment);

            if let Some(pos) = placement.obstacle {
                let id = self.next_entity_id();
                log::debug!("Obstacle {} spawned at ({:.0}, {:.0})", id, pos.x, pos.y);
                self.obstacles.push(Obstacle {
                    id,
                    pos,
                    size: self.tuning.obstacle_size,
                    state: ObstacleState::Alive,
                });
                events.push(GameEvent::ObstacleSpawned { id, pos });
            }

            if let Some(pos) = placement.powerup {
                let id = self.next_entity_id();
                log::debug!("Powerup {} spawned at ({:.0}, {:.0})", id, pos.x, pos.y);
                self.powerups.push(Powerup {
                    id,
                    pos,
                    size: self.tuning.powerup_size,
                    collected: false,
                });
                events.push(GameEvent::PowerupSpawned { id, pos });
            }
        }
    }

    /// Generate track ahead of the player
    pub(crate) fn extend_track(&mut self, events: &mut Vec<GameEvent>) {
        let blocked = self.is_powered();
        let placements = self.track.extend(self.player.pos.x, &self.tuning, blocked);
        self.apply_placements(placements, events);
    }

    /// Drop everything that scrolled far enough behind the camera
    pub(crate) fn retire_behind_camera(&mut self, events: &mut Vec<GameEvent>) {
        let cutoff = self.camera_scroll_x - self.tuning.kill_offset;

        for id in retire_behind(&mut self.segments, cutoff, TrackSegment::right, |s| s.id) {
            events.push(GameEvent::SegmentRetired { id });
        }
        for id in retire_behind(&mut self.obstacles, cutoff, Obstacle::right, |o| o.id) {
            events.push(GameEvent::ObstacleRemoved { id });
        }
        for id in retire_behind(&mut self.powerups, cutoff, Powerup::right, |p| p.id) {
            events.push(GameEvent::PowerupRemoved { id });
        }
    }

    /// Fire deferred effects whose deadline has passed
    pub(crate) fn run_deferred(&mut self, events: &mut Vec<GameEvent>) {
        for effect in self.delays.drain_due(self.now_ms) {
            match effect {
                DeferredEffect::RemoveObstacle(id) => {
                    let before = self.obstacles.len();
                    self.obstacles.retain(|o| o.id != id);
                    if self.obstacles.len() != before {
                        events.push(GameEvent::ObstacleRemoved { id });
                    }
                }
                DeferredEffect::RemovePowerup(id) => {
                    let before = self.powerups.len();
                    self.powerups.retain(|p| p.id != id);
                    if self.powerups.len() != before {
                        events.push(GameEvent::PowerupRemoved { id });
                    }
                }
                DeferredEffect::ExpireCharge => {
                    if self.player.charges > 0 {
                        self.player.charges -= 1;
                        log::debug!("Powerup charge expired, {} remaining", self.player.charges);
                        events.push(GameEvent::ChargeExpired {
                            remaining: self.player.charges,
                        });
                    }
                }
                DeferredEffect::RemovePopup(id) => {
                    self.popups.retain(|p| p.id != id);
                    events.push(GameEvent::PopupExpired { id });
                }
            }
        }
    }

    /// Close the superstar window once it runs out
    pub(crate) fn update_superstar(&mut self, events: &mut Vec<GameEvent>) {
        if let Some(until) = self.superstar_until_ms {
            if self.now_ms >= until {
                self.superstar_until_ms = None;
                log::info!("Superstar mode ended");
                events.push(GameEvent::SuperstarEnded);
            }
        }
    }

    pub(crate) fn collect_powerup(&mut self, id: u32, events: &mut Vec<GameEvent>) {
        let now = self.now_ms;
        let Some(powerup) = self.powerups.iter_mut().find(|p| p.id == id && !p.collected) else {
            return;
        };
        powerup.collected = true;

        self.player.charges += 1;
        self.delays
            .schedule(now + self.tuning.powerup_duration_ms, DeferredEffect::ExpireCharge);
        self.delays
            .schedule(now + self.tuning.collect_effect_ms, DeferredEffect::RemovePowerup(id));

        let was_powered = self.is_powered();
        self.superstar_until_ms = Some(now + self.tuning.powerup_duration_ms);
        if !was_powered {
            log::info!("Superstar mode started");
            events.push(GameEvent::SuperstarStarted);
        }

        log::debug!("Powerup {} collected, {} active charges", id, self.player.charges);
        events.push(GameEvent::PowerupCollected {
            id,
            charges: self.player.charges,
        });
    }

    /// Physics reported the player touching an obstacle
    pub(crate) fn handle_obstacle_contact(&mut self, id: u32, events: &mut Vec<GameEvent>) {
        let Some(index) = self.obstacles.iter().position(|o| o.id == id && o.is_alive()) else {
            return;
        };
        if self.is_powered() || self.player.attacking {
            self.defeat_obstacle(index, events);
            self.economy.blocked_by_obstacle = false;
        } else {
            self.economy.blocked_by_obstacle = true;
        }
    }

    /// Defeat every live obstacle inside the attack hitbox
    pub(crate) fn attack_sweep(&mut self, events: &mut Vec<GameEvent>) {
        let hitbox = attack_hitbox(&self.player.bounds());
        events.push(GameEvent::AttackStarted { hitbox });
        let hits: Vec<usize> = self
            .obstacles
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_alive() && o.hitbox().intersects(&hitbox))
            .map(|(i, _)| i)
            .collect();
        for index in hits {
            self.defeat_obstacle(index, events);
        }
    }

    fn defeat_obstacle(&mut self, index: usize, events: &mut Vec<GameEvent>) {
        let now = self.now_ms;
        let powered = self.is_powered();
        let (id, pos) = {
            let obstacle = &mut self.obstacles[index];
            if !obstacle.is_alive() {
                return;
            }
            obstacle.state = ObstacleState::Defeated { at_ms: now };
            (obstacle.id, obstacle.pos)
        };

        let points = self.economy.award_kill(powered, &self.tuning);
        self.delays
            .schedule(now + self.tuning.defeat_animation_ms, DeferredEffect::RemoveObstacle(id));
        log::debug!("Obstacle {} defeated for {} points", id, points);
        events.push(GameEvent::ObstacleDefeated { id, points });

        let text = if powered {
            format!("+{} ({}x)", points, self.tuning.powerup_score_multiplier)
        } else {
            format!("+{}", points)
        };
        let popup_id = self.next_entity_id();
        self.popups.push(ScorePopup {
            id: popup_id,
            pos,
            text: text.clone(),
        });
        self.delays
            .schedule(now + self.tuning.popup_ms, DeferredEffect::RemovePopup(popup_id));
        events.push(GameEvent::ScorePopup {
            id: popup_id,
            pos,
            text,
        });
    }

    /// Fell off the world: spend a life and restart or finish
    pub(crate) fn lose_life(&mut self, events: &mut Vec<GameEvent>) {
        if self.superstar_until_ms.take().is_some() {
            events.push(GameEvent::SuperstarEnded);
        }
        self.player.reset_transient();

        let outcome = self.economy.lose_life();
        log::info!("Life lost, {} remaining", self.economy.lives);
        events.push(GameEvent::LifeLost {
            lives_left: self.economy.lives,
        });

        match outcome {
            LifeOutcome::Restart(handoff) => {
                self.phase = RunPhase::Restarting(handoff);
                events.push(GameEvent::RunRestarting(handoff));
            }
            LifeOutcome::Exhausted => self.finish(events),
        }
    }

    /// Compose the final score and end the run
    pub(crate) fn finish(&mut self, events: &mut Vec<GameEvent>) {
        let score = self.economy.finalize(&self.tuning);
        let won = score.is_win(&self.tuning);
        log::info!(
            "Run finished: base={} distance={} lives={} total={} -> {}",
            score.base,
            score.distance_bonus,
            score.life_bonus,
            score.total,
            if won { "win" } else { "lose" }
        );
        self.phase = RunPhase::Finished { score, won };
        events.push(GameEvent::RunFinished { score, won });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(Tuning::default(), 42, &Handoff::default())
    }

    #[test]
    fn test_new_run_lays_flat_ground() {
        let s = state();
        let tuning = &s.tuning;
        let ground = tuning.ground_y();
        // Contiguous ground up to 2 viewports minus a segment, then one gapped piece
        assert!(s.segments.len() >= 2);
        assert_eq!(s.segments[0].left(), 0.0);
        for pair in s.segments.windows(2) {
            assert!(pair[0].right() <= pair[1].left());
        }
        assert!(s.segments.iter().all(|seg| seg.center.y == ground));
        let last = s.segments.last().unwrap();
        let prev = &s.segments[s.segments.len() - 2];
        assert_eq!(last.left() - prev.right(), tuning.first_gap);
        assert_eq!(s.track.frontier(), last.right());
    }

    #[test]
    fn test_player_spawns_on_ground() {
        let s = state();
        let ground_top = s.tuning.ground_y() - s.tuning.segment_height / 2.0;
        let bottom = s.player.bounds().bottom();
        assert!(bottom <= ground_top && ground_top - bottom <= 2.5);
        assert_eq!(s.player.pos.x, s.tuning.viewport_width / 4.0);
    }

    #[test]
    fn test_obstacle_hitbox_is_lower_half() {
        let o = Obstacle {
            id: 1,
            pos: Vec2::new(1000.0, 400.0),
            size: 120.0,
            state: ObstacleState::Alive,
        };
        let hb = o.hitbox();
        assert_eq!(hb.bottom(), 460.0);
        assert_eq!(hb.top(), 400.0);
        assert!((hb.size().x - 96.0).abs() < 1e-4);
    }

    #[test]
    fn test_follow_camera_clamps() {
        let mut s = state();
        s.player.pos.x = 50.0;
        assert_eq!(s.follow_camera(), 0.0);
        s.player.pos.x = 5000.0;
        assert_eq!(s.follow_camera(), 4900.0);
        s.player.pos.x = s.tuning.world_width;
        assert_eq!(s.follow_camera(), s.tuning.world_width - s.tuning.viewport_width);
    }

    #[test]
    fn test_entity_ids_unique() {
        let s = state();
        let mut ids: Vec<u32> = s.segments.iter().map(|x| x.id).collect();
        ids.extend(s.obstacles.iter().map(|o| o.id));
        ids.extend(s.powerups.iter().map(|p| p.id));
        let len = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), len);
    }
}
