//! Carry-over state between runs
//!
//! Written once before a restart or scene change, read and cleared once by
//! the next run. A missing write means a fresh game.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Lives/score/time/distance handed to the next run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    pub lives: u32,
    pub score: u64,
    pub time_left_ms: f64,
    pub max_distance: f32,
}

impl Default for Handoff {
    fn default() -> Self {
        Self {
            lives: 3,
            score: 0,
            time_left_ms: 60_000.0,
            max_distance: 0.0,
        }
    }
}

impl Handoff {
    /// Starting values for a brand-new game under `tuning`
    pub fn fresh(tuning: &Tuning) -> Self {
        Self {
            lives: tuning.starting_lives,
            score: 0,
            time_left_ms: tuning.run_time_ms,
            max_distance: 0.0,
        }
    }
}

/// Single-slot store owned by the scene director
#[derive(Debug, Clone)]
pub struct HandoffStore {
    slot: Option<Handoff>,
    defaults: Handoff,
}

impl Default for HandoffStore {
    fn default() -> Self {
        Self::new(Handoff::default())
    }
}

impl HandoffStore {
    pub fn new(defaults: Handoff) -> Self {
        Self {
            slot: None,
            defaults,
        }
    }

    /// Store values for the next run, replacing any unread write
    pub fn write(&mut self, handoff: Handoff) {
        if self.slot.is_some() {
            log::debug!("Handoff overwritten before it was read");
        }
        self.slot = Some(handoff);
    }

    /// Store the fresh-game defaults
    pub fn write_defaults(&mut self) {
        self.write(self.defaults);
    }

    /// Take the stored values, falling back to defaults; always clears
    pub fn read_and_clear(&mut self) -> Handoff {
        self.slot.take().unwrap_or(self.defaults)
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_reads_defaults() {
        let mut store = HandoffStore::default();
        let h = store.read_and_clear();
        assert_eq!(h.lives, 3);
        assert_eq!(h.score, 0);
        assert_eq!(h.time_left_ms, 60_000.0);
        assert_eq!(h.max_distance, 0.0);
    }

    #[test]
    fn test_read_clears() {
        let mut store = HandoffStore::default();
        store.write(Handoff {
            lives: 2,
            score: 1234,
            time_left_ms: 31_500.0,
            max_distance: 4200.0,
        });
        assert_eq!(store.read_and_clear().score, 1234);
        assert!(store.is_empty());
        assert_eq!(store.read_and_clear(), Handoff::default());
    }

    #[test]
    fn test_write_defaults_replaces_stale_write() {
        let mut store = HandoffStore::new(Handoff::fresh(&Tuning::default()));
        store.write(Handoff {
            lives: 1,
            score: 99,
            time_left_ms: 10.0,
            max_distance: 1.0,
        });
        store.write_defaults();
        assert_eq!(store.read_and_clear(), Handoff::fresh(&Tuning::default()));
    }

    #[test]
    fn test_fresh_follows_tuning() {
        let tuning = Tuning {
            starting_lives: 5,
            run_time_ms: 90_000.0,
            ..Tuning::default()
        };
        let h = Handoff::fresh(&tuning);
        assert_eq!(h.lives, 5);
        assert_eq!(h.time_left_ms, 90_000.0);
    }
}
