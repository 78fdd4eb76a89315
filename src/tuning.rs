//! Data-driven game balance
//!
//! Every gameplay constant lives here so a run can be retuned from JSON
//! without touching the simulation. Missing fields fall back to defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating tuning data
#[derive(Debug)]
pub enum TuningError {
    /// JSON could not be parsed into a `Tuning`
    Parse(serde_json::Error),
    /// A value parsed but is outside its usable range
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(err) => write!(f, "failed to parse tuning: {}", err),
            TuningError::Invalid { field, reason } => {
                write!(f, "invalid tuning value `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(err) => Some(err),
            TuningError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Parse(err)
    }
}

/// Game balance parameters
///
/// Distances are pixels, speeds pixels/second, times milliseconds.
/// Screen coordinates: +x right, +y down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Viewport ===
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Player's distance from the camera's left edge while following
    pub camera_lead: f32,

    // === Physics ===
    /// Downward acceleration
    pub gravity: f32,
    /// Magnitude of the upward jump impulse
    pub jump_velocity: f32,
    /// Distance above the world bottom at which a fall costs a life
    pub fall_margin: f32,
    /// Extra world height below the viewport
    pub world_depth: f32,

    // === Player ===
    pub walk_speed: f32,
    pub run_speed: f32,
    pub powerup_run_speed: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub coyote_time_ms: f64,
    pub jump_buffer_ms: f64,
    /// Mid-air jumps are refused while rising faster than this
    pub multi_jump_rise_threshold: f32,

    // === Input ===
    pub drag_threshold: f32,
    pub tap_max_time_ms: f64,

    // === Track ===
    pub world_width: f32,
    pub base_segment_width: f32,
    pub segment_height: f32,
    pub width_variance: f32,
    pub scroll_margin: f32,
    pub kill_offset: f32,
    pub height_change_chance: f32,
    pub max_rise_factor: f32,
    pub max_drop_factor: f32,
    pub max_rise_above_ground: f32,
    pub min_gap_factor: f32,
    pub gap_safety_margin: f32,
    pub ground_gap_factor: f32,
    pub max_gap_multiplier: f32,
    pub small_gap_bias: f32,
    pub first_gap: f32,

    // === Spawning ===
    pub obstacle_spawn_chance: f32,
    /// Multiple of viewport width before obstacles may appear
    pub obstacle_dead_zone: f32,
    pub obstacle_size: f32,
    pub obstacle_float_chance: f32,
    pub obstacle_float_min: f32,
    pub obstacle_float_max: f32,
    pub powerup_spawn_chance: f32,
    /// Multiple of viewport width before power-ups may appear
    pub powerup_dead_zone: f32,
    pub powerup_min_clearance: f32,
    pub powerup_size: f32,

    // === Economy ===
    pub starting_lives: u32,
    pub run_time_ms: f64,
    pub scoring_interval_ms: f64,
    pub progress_epsilon: f32,
    pub stall_penalty: u64,
    pub obstacle_blocked_penalty: u64,
    pub obstacle_kill_bonus: u64,
    pub powerup_score_multiplier: u64,
    pub powerup_duration_ms: f64,
    pub distance_divisor: f32,
    pub life_bonus: u64,
    pub win_threshold: u64,
    pub low_time_threshold_ms: f64,

    // === Effects ===
    pub defeat_animation_ms: f64,
    pub popup_ms: f64,
    pub collect_effect_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            camera_lead: 100.0,

            gravity: 700.0,
            jump_velocity: 400.0,
            fall_margin: 10.0,
            world_depth: 200.0,

            walk_speed: 200.0,
            run_speed: 250.0,
            powerup_run_speed: 300.0,
            // Sprite frames are 231x355, drawn at half scale
            player_width: 115.5,
            player_height: 177.5,
            coyote_time_ms: 100.0,
            jump_buffer_ms: 150.0,
            multi_jump_rise_threshold: 50.0,

            drag_threshold: 30.0,
            tap_max_time_ms: 250.0,

            world_width: 20_000.0,
            base_segment_width: 300.0,
            segment_height: 32.0,
            width_variance: 0.3,
            scroll_margin: 400.0,
            kill_offset: 800.0,
            height_change_chance: 0.6,
            max_rise_factor: 0.6,
            max_drop_factor: 0.2,
            max_rise_above_ground: 250.0,
            min_gap_factor: 1.1,
            gap_safety_margin: 0.8,
            ground_gap_factor: 0.7,
            max_gap_multiplier: 2.0,
            small_gap_bias: 0.8,
            first_gap: 50.0,

            obstacle_spawn_chance: 0.5,
            obstacle_dead_zone: 1.5,
            obstacle_size: 120.0,
            obstacle_float_chance: 0.6,
            obstacle_float_min: 20.0,
            obstacle_float_max: 100.0,
            powerup_spawn_chance: 0.2,
            powerup_dead_zone: 2.0,
            powerup_min_clearance: 50.0,
            powerup_size: 40.0,

            starting_lives: 3,
            run_time_ms: 60_000.0,
            scoring_interval_ms: 500.0,
            progress_epsilon: 1.0,
            stall_penalty: 3,
            obstacle_blocked_penalty: 5,
            obstacle_kill_bonus: 200,
            powerup_score_multiplier: 2,
            powerup_duration_ms: 15_000.0,
            distance_divisor: 100.0,
            life_bonus: 1000,
            win_threshold: 5000,
            low_time_threshold_ms: 15_000.0,

            defeat_animation_ms: 1500.0,
            popup_ms: 1500.0,
            collect_effect_ms: 1000.0,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON (partial documents allowed)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check that values keep the simulation well-defined
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: "must be a positive number",
                })
            }
        }
        fn non_negative(field: &'static str, value: f64) -> Result<(), TuningError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: "must be zero or a positive number",
                })
            }
        }
        fn chance(field: &'static str, value: f32) -> Result<(), TuningError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: "must be a probability in [0, 1]",
                })
            }
        }

        positive("viewport_width", self.viewport_width)?;
        positive("viewport_height", self.viewport_height)?;
        positive("gravity", self.gravity)?;
        positive("jump_velocity", self.jump_velocity)?;
        positive("walk_speed", self.walk_speed)?;
        positive("run_speed", self.run_speed)?;
        positive("powerup_run_speed", self.powerup_run_speed)?;
        positive("player_width", self.player_width)?;
        positive("player_height", self.player_height)?;
        positive("world_width", self.world_width)?;
        positive("base_segment_width", self.base_segment_width)?;
        positive("segment_height", self.segment_height)?;
        positive("distance_divisor", self.distance_divisor)?;
        positive("gap_safety_margin", self.gap_safety_margin)?;
        positive("ground_gap_factor", self.ground_gap_factor)?;
        positive("max_gap_multiplier", self.max_gap_multiplier)?;
        positive("obstacle_size", self.obstacle_size)?;
        positive("powerup_size", self.powerup_size)?;

        // Height walk bounds; negative values invert the clamp range
        non_negative("max_rise_above_ground", f64::from(self.max_rise_above_ground))?;
        non_negative("max_rise_factor", f64::from(self.max_rise_factor))?;
        non_negative("max_drop_factor", f64::from(self.max_drop_factor))?;
        // Negative gaps would overlap segments
        non_negative("min_gap_factor", f64::from(self.min_gap_factor))?;
        non_negative("first_gap", f64::from(self.first_gap))?;
        non_negative("world_depth", f64::from(self.world_depth))?;
        non_negative("fall_margin", f64::from(self.fall_margin))?;
        non_negative("scroll_margin", f64::from(self.scroll_margin))?;
        non_negative("kill_offset", f64::from(self.kill_offset))?;
        non_negative("obstacle_float_min", f64::from(self.obstacle_float_min))?;
        non_negative("drag_threshold", f64::from(self.drag_threshold))?;
        non_negative("progress_epsilon", f64::from(self.progress_epsilon))?;
        non_negative("multi_jump_rise_threshold", f64::from(self.multi_jump_rise_threshold))?;
        non_negative("coyote_time_ms", self.coyote_time_ms)?;
        non_negative("jump_buffer_ms", self.jump_buffer_ms)?;
        non_negative("tap_max_time_ms", self.tap_max_time_ms)?;
        non_negative("scoring_interval_ms", self.scoring_interval_ms)?;
        non_negative("powerup_duration_ms", self.powerup_duration_ms)?;
        non_negative("low_time_threshold_ms", self.low_time_threshold_ms)?;
        non_negative("defeat_animation_ms", self.defeat_animation_ms)?;
        non_negative("popup_ms", self.popup_ms)?;
        non_negative("collect_effect_ms", self.collect_effect_ms)?;

        chance("height_change_chance", self.height_change_chance)?;
        chance("small_gap_bias", self.small_gap_bias)?;
        chance("obstacle_spawn_chance", self.obstacle_spawn_chance)?;
        chance("obstacle_float_chance", self.obstacle_float_chance)?;
        chance("powerup_spawn_chance", self.powerup_spawn_chance)?;
        chance("gap_safety_margin", self.gap_safety_margin)?;

        if !(0.0..1.0).contains(&self.width_variance) {
            return Err(TuningError::Invalid {
                field: "width_variance",
                reason: "must be in [0, 1)",
            });
        }
        if self.obstacle_float_min > self.obstacle_float_max {
            return Err(TuningError::Invalid {
                field: "obstacle_float_min",
                reason: "must not exceed obstacle_float_max",
            });
        }
        if self.world_width <= self.base_segment_width * (1.0 + self.width_variance) {
            return Err(TuningError::Invalid {
                field: "world_width",
                reason: "must fit at least one segment",
            });
        }
        if self.starting_lives == 0 {
            return Err(TuningError::Invalid {
                field: "starting_lives",
                reason: "a run needs at least one life",
            });
        }
        if self.run_time_ms.is_nan() || self.run_time_ms <= 0.0 {
            return Err(TuningError::Invalid {
                field: "run_time_ms",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Y coordinate of a ground-level segment's center
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.viewport_height - self.segment_height / 2.0
    }

    /// Y coordinate of the world's bottom edge
    #[inline]
    pub fn world_bottom(&self) -> f32 {
        self.viewport_height + self.world_depth
    }

    /// Player center Y when standing on ground level
    #[inline]
    pub fn player_spawn_y(&self) -> f32 {
        self.ground_y() - self.segment_height / 2.0 - self.player_height / 2.0 - 2.0
    }

    /// Player spawn X
    #[inline]
    pub fn player_spawn_x(&self) -> f32 {
        self.viewport_width / 4.0
    }

    /// Airtime of a full jump that lands at take-off height (seconds)
    #[inline]
    pub fn max_air_time(&self) -> f32 {
        2.0 * self.jump_velocity.abs() / self.gravity
    }

    /// Peak height of a jump above take-off
    #[inline]
    pub fn jump_apex(&self) -> f32 {
        self.jump_velocity * self.jump_velocity / (2.0 * self.gravity)
    }

    /// Largest upward step the generator may place
    #[inline]
    pub fn max_rise(&self) -> f32 {
        self.player_height * self.max_rise_factor
    }
}
