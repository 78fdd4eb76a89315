//! Score, lives, and the countdown
//!
//! Scoring rewards forward progress every tick and bleeds points while the
//! player stalls. Final scoring adds a distance bonus and a per-life bonus,
//! and the total decides win or lose.

use serde::{Deserialize, Serialize};

use crate::handoff::Handoff;
use crate::tuning::Tuning;

/// End-of-run score breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub base: u64,
    pub distance_bonus: u64,
    pub life_bonus: u64,
    pub total: u64,
}

impl FinalScore {
    pub fn compose(score: u64, max_distance: f32, lives: u32, tuning: &Tuning) -> Self {
        let distance_bonus = (max_distance.max(0.0) / tuning.distance_divisor).floor() as u64;
        let life_bonus = lives as u64 * tuning.life_bonus;
        Self {
            base: score,
            distance_bonus,
            life_bonus,
            total: score + distance_bonus + life_bonus,
        }
    }

    /// Boundary-inclusive win check
    pub fn is_win(&self, tuning: &Tuning) -> bool {
        self.total >= tuning.win_threshold
    }
}

/// What a progress check did to the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreChange {
    Progress,
    Penalty(u64),
}

/// What happens after a life is lost
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifeOutcome {
    /// Lives remain; restart with this carry-over
    Restart(Handoff),
    /// No lives left
    Exhausted,
}

/// Per-run score/life/timer state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEconomy {
    pub score: u64,
    pub lives: u32,
    pub time_left_ms: f64,
    pub max_distance: f32,
    pub blocked_by_obstacle: bool,
    /// Player X at the previous progress check
    last_x: f32,
    /// When the stall timer last reset
    stall_since_ms: f64,
}

impl RunEconomy {
    pub fn from_handoff(handoff: &Handoff, start_x: f32, now_ms: f64) -> Self {
        Self {
            score: handoff.score,
            lives: handoff.lives,
            time_left_ms: handoff.time_left_ms.max(0.0),
            max_distance: handoff.max_distance.max(0.0),
            blocked_by_obstacle: false,
            last_x: start_x,
            stall_since_ms: now_ms,
        }
    }

    /// Count down; returns true once time has run out
    pub fn tick_clock(&mut self, dt_ms: f64) -> bool {
        self.time_left_ms = (self.time_left_ms - dt_ms.max(0.0)).max(0.0);
        self.time_left_ms <= 0.0
    }

    pub fn is_low_time(&self, tuning: &Tuning) -> bool {
        self.seconds_left() as f64 * 1000.0 <= tuning.low_time_threshold_ms
    }

    /// Whole seconds left, rounded up
    pub fn seconds_left(&self) -> u64 {
        (self.time_left_ms / 1000.0).ceil() as u64
    }

    pub fn track_distance(&mut self, x: f32) {
        if x > self.max_distance {
            self.max_distance = x;
        }
    }

    /// Reward forward motion, penalize stalls
    pub fn score_progress(&mut self, x: f32, now_ms: f64, tuning: &Tuning) -> Option<ScoreChange> {
        let change = if x > self.last_x + tuning.progress_epsilon {
            self.score += 1;
            self.stall_since_ms = now_ms;
            self.blocked_by_obstacle = false;
            Some(ScoreChange::Progress)
        } else if now_ms - self.stall_since_ms > tuning.scoring_interval_ms {
            let penalty = if self.blocked_by_obstacle {
                tuning.obstacle_blocked_penalty
            } else {
                tuning.stall_penalty
            };
            self.score = self.score.saturating_sub(penalty);
            self.stall_since_ms = now_ms;
            Some(ScoreChange::Penalty(penalty))
        } else {
            None
        };
        self.last_x = x;
        change
    }

    /// Points for defeating an obstacle
    pub fn award_kill(&mut self, powered: bool, tuning: &Tuning) -> u64 {
        let points = if powered {
            tuning.obstacle_kill_bonus * tuning.powerup_score_multiplier
        } else {
            tuning.obstacle_kill_bonus
        };
        self.score += points;
        points
    }

    /// Values carried to the next run
    pub fn handoff(&self) -> Handoff {
        Handoff {
            lives: self.lives,
            score: self.score,
            time_left_ms: self.time_left_ms,
            max_distance: self.max_distance,
        }
    }

    pub fn lose_life(&mut self) -> LifeOutcome {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            LifeOutcome::Exhausted
        } else {
            LifeOutcome::Restart(self.handoff())
        }
    }

    pub fn finalize(&self, tuning: &Tuning) -> FinalScore {
        FinalScore::compose(self.score, self.max_distance, self.lives, tuning)
    }
}
