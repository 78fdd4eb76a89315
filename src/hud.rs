//! HUD view model
//!
//! Plain data the front end copies into the DOM each frame.

use serde::{Deserialize, Serialize};

use crate::sim::GameState;

/// Timer pulse period while time is low
const PULSE_PERIOD_MS: f64 = 400.0;

/// Everything the heads-up display shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub lives: u32,
    /// `M:SS`
    pub timer_text: String,
    pub low_time: bool,
    /// Timer scale; 1.0 unless time is low
    pub timer_pulse: f32,
    /// Seconds of superstar left, if active
    pub superstar_seconds: Option<u64>,
    /// One slot per charge: `true` if still usable in this airtime
    pub jump_icons: Vec<bool>,
}

impl HudSnapshot {
    pub fn from_state(state: &GameState) -> Self {
        let economy = &state.economy;
        let low_time = economy.is_low_time(&state.tuning);
        let timer_pulse = if low_time {
            let phase = (state.now_ms / PULSE_PERIOD_MS * std::f64::consts::PI).sin().abs();
            1.0 + 0.2 * phase as f32
        } else {
            1.0
        };

        let superstar_seconds = state
            .superstar_until_ms
            .filter(|_| state.is_powered())
            .map(|until| ((until - state.now_ms) / 1000.0).ceil() as u64);

        let player = &state.player;
        let jump_icons = (0..player.charges)
            .map(|i| i >= player.mid_air_jumps_used)
            .collect();

        Self {
            score: economy.score,
            lives: economy.lives,
            timer_text: format_clock(economy.time_left_ms),
            low_time,
            timer_pulse,
            superstar_seconds,
            jump_icons,
        }
    }
}

/// Format milliseconds as `M:SS`, rounding up to the next whole second
pub fn format_clock(ms: f64) -> String {
    let total = (ms.max(0.0) / 1000.0).ceil() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::Handoff;
    use crate::tuning::Tuning;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(60_000.0), "1:00");
        assert_eq!(format_clock(59_001.0), "1:00");
        assert_eq!(format_clock(59_000.0), "0:59");
        assert_eq!(format_clock(9_500.0), "0:10");
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(-5.0), "0:00");
    }

    #[test]
    fn test_snapshot_reflects_economy() {
        let mut state = GameState::new(Tuning::default(), 3, &Handoff::default());
        state.economy.score = 1234;
        let hud = HudSnapshot::from_state(&state);
        assert_eq!(hud.score, 1234);
        assert_eq!(hud.lives, 3);
        assert_eq!(hud.timer_text, "1:00");
        assert!(!hud.low_time);
        assert_eq!(hud.timer_pulse, 1.0);
        assert_eq!(hud.superstar_seconds, None);
        assert!(hud.jump_icons.is_empty());
    }

    #[test]
    fn test_low_time_pulses() {
        let mut state = GameState::new(Tuning::default(), 3, &Handoff::default());
        state.economy.time_left_ms = 10_000.0;
        state.now_ms = 200.0;
        let hud = HudSnapshot::from_state(&state);
        assert!(hud.low_time);
        assert!(hud.timer_pulse > 1.0 && hud.timer_pulse <= 1.2);
    }

    #[test]
    fn test_superstar_and_charges() {
        let mut state = GameState::new(Tuning::default(), 3, &Handoff::default());
        state.now_ms = 1000.0;
        state.superstar_until_ms = Some(15_500.0);
        state.player.charges = 2;
        state.player.mid_air_jumps_used = 1;
        let hud = HudSnapshot::from_state(&state);
        assert_eq!(hud.superstar_seconds, Some(15));
        assert_eq!(hud.jump_icons, vec![false, true]);
    }
}
