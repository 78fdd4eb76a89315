//! Procedural track generation
//!
//! Segments are placed left to right ahead of the player. Every gap is
//! bounded by what a jump can clear given the height change between the
//! two segments, and every segment lies inside the world.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::tuning::Tuning;

/// One generated segment with its optional attachments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub center: Vec2,
    pub width: f32,
    /// Obstacle sprite center
    pub obstacle: Option<Vec2>,
    /// Power-up center
    pub powerup: Option<Vec2>,
}

/// Horizontal distance covered by a full jump at power-up speed
pub fn max_jump_distance(tuning: &Tuning) -> f32 {
    tuning.powerup_run_speed * tuning.max_air_time()
}

/// Horizontal reach of a jump that lands `rise` px above take-off
///
/// Uses the descending half of the arc, so higher landings shorten the
/// reach. Drops are treated as level.
pub fn reach_for_rise(tuning: &Tuning, rise: f32) -> f32 {
    let v = tuning.jump_velocity.abs();
    let g = tuning.gravity;
    let disc = v * v - 2.0 * g * rise.max(0.0);
    if disc < 0.0 {
        return 0.0;
    }
    tuning.powerup_run_speed * (v + disc.sqrt()) / g
}

/// Smallest gap the generator leaves between segments
#[inline]
pub fn min_gap(tuning: &Tuning) -> f32 {
    tuning.player_width * tuning.min_gap_factor
}

/// Largest gap that stays clearable when the next segment sits `rise` px
/// higher than the current one
pub fn safe_max_gap(tuning: &Tuning, rise: f32, from_ground: bool) -> f32 {
    let mut limit = reach_for_rise(tuning, rise) * tuning.gap_safety_margin;
    if from_ground {
        limit *= tuning.ground_gap_factor;
    }

    let multiplier = if rise > tuning.player_height * 0.3 {
        tuning.max_gap_multiplier * 0.6
    } else if rise > 0.0 {
        tuning.max_gap_multiplier * 0.8
    } else {
        tuning.max_gap_multiplier
    };
    limit = limit.min(tuning.base_segment_width * multiplier);

    limit.max(min_gap(tuning))
}

/// Uniform draw in `[lo, hi]` that tolerates an empty range
fn range_f32(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Draw a gap biased toward the small end of `[min, max]`
pub fn draw_gap(rng: &mut Pcg32, min: f32, max: f32, small_bias: f32) -> f32 {
    let range = (max - min).max(0.0);
    let gap = if rng.random::<f32>() < small_bias {
        range_f32(rng, min, min + range * 0.75)
    } else {
        range_f32(rng, min + range * 0.6, max)
    };
    gap.clamp(min, min + range)
}

/// Remove entries whose right edge is left of `cutoff`; returns their IDs
pub fn retire_behind<T>(
    items: &mut Vec<T>,
    cutoff: f32,
    right_edge: impl Fn(&T) -> f32,
    id: impl Fn(&T) -> u32,
) -> Vec<u32> {
    let mut retired = Vec::new();
    items.retain(|item| {
        if right_edge(item) < cutoff {
            retired.push(id(item));
            false
        } else {
            true
        }
    });
    retired
}

/// Generator state: where the track ends and how high it was
#[derive(Debug, Clone)]
pub struct TrackGenerator {
    rng: Pcg32,
    frontier: f32,
    last_y: f32,
    complete: bool,
}

impl TrackGenerator {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            frontier: 0.0,
            last_y: tuning.ground_y(),
            complete: false,
        }
    }

    /// Right edge of the last placed segment
    pub fn frontier(&self) -> f32 {
        self.frontier
    }

    /// No more segments fit in the world
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Lay contiguous ground up to two viewports out, then one short gap
    pub fn lay_ground(&mut self, tuning: &Tuning) -> Vec<Placement> {
        let ground = tuning.ground_y();
        let width = tuning.base_segment_width;
        let end = tuning.viewport_width * 2.0 - width;

        let mut placements = Vec::new();
        let mut x = 0.0;
        while x < end {
            placements.push(self.place(Vec2::new(x + width / 2.0, ground), width, tuning, false));
            x += width;
        }

        let left = x + tuning.first_gap;
        placements.push(self.place(Vec2::new(left + width / 2.0, ground), width, tuning, false));
        self.frontier = left + width;
        self.last_y = ground;

        log::debug!("Laid {} ground segments up to x={:.0}", placements.len(), self.frontier);
        placements
    }

    /// Place segments until the frontier is `scroll_margin` past the
    /// viewport's right edge, or the world runs out
    pub fn extend(&mut self, player_x: f32, tuning: &Tuning, powerups_blocked: bool) -> Vec<Placement> {
        let mut placements = Vec::new();
        if self.complete {
            return placements;
        }

        let target = player_x + tuning.viewport_width + tuning.scroll_margin;
        let stop_at = tuning.world_width - tuning.base_segment_width;
        let min_width = tuning.base_segment_width * (1.0 - tuning.width_variance);
        let max_width = tuning.base_segment_width * (1.0 + tuning.width_variance);

        while self.frontier < target {
            if self.frontier >= stop_at {
                self.complete = true;
                log::info!("Track complete at x={:.0}", self.frontier);
                break;
            }

            let mut width = range_f32(&mut self.rng, min_width, max_width);
            let y = self.next_height(tuning);
            let rise = self.last_y - y;
            let from_ground = (self.last_y - tuning.ground_y()).abs() < 0.5;

            let max_gap = safe_max_gap(tuning, rise, from_ground);
            let gap = draw_gap(&mut self.rng, min_gap(tuning), max_gap, tuning.small_gap_bias);

            let left = self.frontier + gap;
            let room = tuning.world_width - left;
            if room < width {
                if room < min_width {
                    self.complete = true;
                    log::info!("Track complete at x={:.0}", self.frontier);
                    break;
                }
                width = room;
            }

            let center = Vec2::new(left + width / 2.0, y);
            placements.push(self.place(center, width, tuning, powerups_blocked));
            self.frontier = left + width;
            self.last_y = y;
        }

        if !placements.is_empty() {
            log::trace!("Extended track by {} segments to x={:.0}", placements.len(), self.frontier);
        }
        placements
    }

    /// Next segment height: usually a bounded random walk from the last one
    fn next_height(&mut self, tuning: &Tuning) -> f32 {
        let ground = tuning.ground_y();
        if self.rng.random::<f32>() >= tuning.height_change_chance {
            return ground;
        }
        let min_y = (ground - tuning.max_rise_above_ground).max(self.last_y - tuning.max_rise());
        let max_y = ground.min(self.last_y + tuning.player_height * tuning.max_drop_factor);
        range_f32(&mut self.rng, min_y, max_y).clamp(min_y, ground)
    }

    /// Roll obstacle and power-up attachments for a segment
    fn place(&mut self, center: Vec2, width: f32, tuning: &Tuning, powerups_blocked: bool) -> Placement {
        let top = center.y - tuning.segment_height / 2.0;

        let obstacle = if center.x > tuning.viewport_width * tuning.obstacle_dead_zone
            && self.rng.random::<f32>() < tuning.obstacle_spawn_chance
        {
            let lift = if self.rng.random::<f32>() < tuning.obstacle_float_chance {
                range_f32(&mut self.rng, tuning.obstacle_float_min, tuning.obstacle_float_max)
            } else {
                0.0
            };
            Some(Vec2::new(center.x, top - tuning.obstacle_size / 2.0 - lift))
        } else {
            None
        };

        let powerup = if !powerups_blocked
            && center.x > tuning.viewport_width * tuning.powerup_dead_zone
            && self.rng.random::<f32>() < tuning.powerup_spawn_chance
        {
            let drift = range_f32(&mut self.rng, 0.0, tuning.player_height);
            // Keep it inside the band a standing jump from this segment sweeps
            let reachable = top - tuning.player_height - tuning.jump_apex() * 0.9;
            let y = (tuning.viewport_height * 0.6 - drift)
                .min(top - tuning.powerup_min_clearance)
                .max(reachable);
            Some(Vec2::new(center.x, y))
        } else {
            None
        };

        Placement {
            center,
            width,
            obstacle,
            powerup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Run the generator to the end of the world
    fn full_track(seed: u64, tuning: &Tuning) -> (TrackGenerator, Vec<Placement>) {
        let mut generator = TrackGenerator::new(seed, tuning);
        let mut all = generator.lay_ground(tuning);
        let mut player_x = tuning.player_spawn_x();
        while !generator.is_complete() {
            all.extend(generator.extend(player_x, tuning, false));
            player_x += 500.0;
            assert!(player_x < tuning.world_width * 2.0, "generator never completed");
        }
        (generator, all)
    }

    #[test]
    fn test_max_jump_distance_defaults() {
        let tuning = Tuning::default();
        let d = max_jump_distance(&tuning);
        assert!((d - 342.857).abs() < 0.01);
        assert!((reach_for_rise(&tuning, 0.0) - d).abs() < 1e-3);
    }

    #[test]
    fn test_gap_never_below_min() {
        let tuning = Tuning::default();
        // Rise beyond jump apex collapses the reach; the floor holds
        assert_eq!(safe_max_gap(&tuning, 500.0, true), min_gap(&tuning));
        assert!(safe_max_gap(&tuning, 0.0, false) > min_gap(&tuning));
    }

    #[test]
    fn test_ground_takeoff_is_tighter() {
        let tuning = Tuning::default();
        assert!(safe_max_gap(&tuning, 0.0, true) < safe_max_gap(&tuning, 0.0, false));
    }

    #[test]
    fn test_draw_gap_with_empty_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(draw_gap(&mut rng, 127.0, 127.0, 0.8), 127.0);
        }
    }

    #[test]
    fn test_track_stays_inside_world() {
        let tuning = Tuning::default();
        let (generator, track) = full_track(7, &tuning);
        assert!(generator.frontier() <= tuning.world_width);
        for p in &track {
            assert!(p.center.x - p.width / 2.0 >= 0.0);
            assert!(p.center.x + p.width / 2.0 <= tuning.world_width + 1e-3);
        }
    }

    #[test]
    fn test_extend_after_complete_is_noop() {
        let tuning = Tuning::default();
        let (mut generator, _) = full_track(3, &tuning);
        let frontier = generator.frontier();
        assert!(generator.extend(tuning.world_width, &tuning, false).is_empty());
        assert_eq!(generator.frontier(), frontier);
    }

    #[test]
    fn test_extend_fills_past_viewport() {
        let tuning = Tuning::default();
        let mut generator = TrackGenerator::new(11, &tuning);
        generator.lay_ground(&tuning);
        generator.extend(3000.0, &tuning, false);
        assert!(generator.frontier() >= 3000.0 + tuning.viewport_width + tuning.scroll_margin);
    }

    #[test]
    fn test_blocked_powerups_never_spawn() {
        let tuning = Tuning {
            powerup_spawn_chance: 1.0,
            ..Tuning::default()
        };
        let mut generator = TrackGenerator::new(5, &tuning);
        generator.lay_ground(&tuning);
        let placements = generator.extend(5000.0, &tuning, true);
        assert!(!placements.is_empty());
        assert!(placements.iter().all(|p| p.powerup.is_none()));
    }

    #[test]
    fn test_nothing_spawns_in_dead_zones() {
        let tuning = Tuning {
            obstacle_spawn_chance: 1.0,
            powerup_spawn_chance: 1.0,
            ..Tuning::default()
        };
        let (_, track) = full_track(9, &tuning);
        for p in &track {
            if p.obstacle.is_some() {
                assert!(p.center.x > tuning.viewport_width * tuning.obstacle_dead_zone);
            }
            if p.powerup.is_some() {
                assert!(p.center.x > tuning.viewport_width * tuning.powerup_dead_zone);
            }
        }
    }

    #[test]
    fn test_powerups_are_jump_reachable() {
        let tuning = Tuning {
            powerup_spawn_chance: 1.0,
            ..Tuning::default()
        };
        let (_, track) = full_track(21, &tuning);
        for p in track.iter() {
            let Some(pos) = p.powerup else { continue };
            let top = p.center.y - tuning.segment_height / 2.0;
            let apex_head = top - tuning.player_height - tuning.jump_apex();
            assert!(pos.y + tuning.powerup_size / 2.0 > apex_head);
            assert!(pos.y <= top - tuning.powerup_min_clearance);
        }
    }

    #[test]
    fn test_retire_behind() {
        let mut xs = vec![(1u32, 10.0f32), (2, 500.0), (3, 90.0)];
        let gone = retire_behind(&mut xs, 100.0, |e| e.1, |e| e.0);
        assert_eq!(gone, vec![1, 3]);
        assert_eq!(xs, vec![(2, 500.0)]);
    }

    #[test]
    fn test_zero_rise_band_stays_on_ground() {
        let tuning = Tuning {
            max_rise_above_ground: 0.0,
            max_drop_factor: 0.0,
            height_change_chance: 1.0,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_ok());
        let (_, track) = full_track(9, &tuning);
        assert!(track.iter().all(|p| (p.center.y - tuning.ground_y()).abs() < 1e-3));
    }

    #[test]
    fn test_same_seed_same_track() {
        let tuning = Tuning::default();
        let (_, a) = full_track(1234, &tuning);
        let (_, b) = full_track(1234, &tuning);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_gaps_respect_jump_bounds(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let (_, track) = full_track(seed, &tuning);
            let laid = TrackGenerator::new(seed, &tuning).lay_ground(&tuning).len();
            let ground = tuning.ground_y();
            // f32 edges far from the origin
            let tol = 1e-2;
            for (i, pair) in track.windows(2).enumerate() {
                let (a, b) = (&pair[0], &pair[1]);
                let gap = (b.center.x - b.width / 2.0) - (a.center.x + a.width / 2.0);
                if i + 2 < laid {
                    prop_assert!(gap.abs() < tol);
                    continue;
                }
                if i + 2 == laid {
                    prop_assert!((gap - tuning.first_gap).abs() < tol);
                    continue;
                }
                let rise = a.center.y - b.center.y;
                let from_ground = (a.center.y - ground).abs() < 0.5;
                prop_assert!(gap >= min_gap(&tuning) - tol);
                prop_assert!(gap <= safe_max_gap(&tuning, rise, from_ground) + tol);
            }
        }

        #[test]
        fn prop_heights_stay_in_band(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let (_, track) = full_track(seed, &tuning);
            let ground = tuning.ground_y();
            for pair in track.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(b.center.y <= ground);
                prop_assert!(b.center.y >= ground - tuning.max_rise_above_ground - 1e-3);
                prop_assert!(a.center.y - b.center.y <= tuning.max_rise() + 1e-3);
            }
        }

        #[test]
        fn prop_max_gap_shrinks_with_rise(a in 0.0f32..106.5, b in 0.0f32..106.5) {
            let tuning = Tuning::default();
            let floor = min_gap(&tuning);
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            prop_assume!(hi - lo > 1e-2);
            let g_lo = safe_max_gap(&tuning, lo, false);
            let g_hi = safe_max_gap(&tuning, hi, false);
            if g_hi > floor {
                prop_assert!(g_hi < g_lo);
            } else {
                prop_assert!(g_hi <= g_lo);
            }
            prop_assert!(safe_max_gap(&tuning, hi, true) <= safe_max_gap(&tuning, lo, true));
        }
    }
}
