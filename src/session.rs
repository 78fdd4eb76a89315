//! Fixed-step session loop
//!
//! Glues the input tracker, the reference physics, and the scene director
//! together. The front end feeds it raw input and frame deltas; it runs
//! the simulation at `SIM_DT_MS` with a capped number of substeps.

use crate::consts::{MAX_FRAME_MS, MAX_SUBSTEPS, SIM_DT_MS};
use crate::director::{SceneDirector, SceneEvent, SceneKind};
use crate::hud::HudSnapshot;
use crate::sim::{ArcadeWorld, GameEvent, InputTracker, Key, RawInput, TickInput};
use crate::tuning::Tuning;

/// One player's session: scenes, input, and physics
pub struct Session {
    director: SceneDirector,
    input: InputTracker,
    /// Keys currently down, tracked across scenes to spot auto-repeat
    held_keys: Vec<Key>,
    physics: Option<ArcadeWorld>,
    /// Run number the physics body belongs to
    physics_run: u64,
    accumulator_ms: f32,
    clock_ms: f64,
    autopilot: bool,
}

impl Session {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let director = SceneDirector::new(tuning, seed);
        let input = InputTracker::new(director.tuning());
        Self {
            director,
            input,
            held_keys: Vec::new(),
            physics: None,
            physics_run: 0,
            accumulator_ms: 0.0,
            clock_ms: 0.0,
            autopilot: false,
        }
    }

    pub fn director(&self) -> &SceneDirector {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut SceneDirector {
        &mut self.director
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&SceneEvent) + 'static) {
        self.director.subscribe(observer);
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        if enabled != self.autopilot {
            log::info!("Autopilot: {}", if enabled { "on" } else { "off" });
        }
        self.autopilot = enabled;
    }

    /// HUD for the active run
    pub fn hud(&self) -> Option<HudSnapshot> {
        self.director.game_state().map(HudSnapshot::from_state)
    }

    /// Feed one raw input event. Outside gameplay, a fresh press advances
    /// the scene; a key still held from the last run does not.
    pub fn handle_input(&mut self, event: RawInput) {
        let press = match event {
            RawInput::KeyDown(key) => {
                let fresh = !self.held_keys.contains(&key);
                if fresh {
                    self.held_keys.push(key);
                }
                fresh
            }
            RawInput::KeyUp(key) => {
                self.held_keys.retain(|&k| k != key);
                false
            }
            RawInput::PointerDown { .. } => true,
            _ => false,
        };
        match self.director.scene_kind() {
            SceneKind::Playing => self.input.handle(event, self.clock_ms),
            SceneKind::Splash if press => self.director.start_game(),
            SceneKind::Won | SceneKind::Lost if press => self.director.restart(),
            _ => {}
        }
    }

    /// Advance by one rendered frame of `dt_ms`; returns every substep's events
    pub fn frame(&mut self, dt_ms: f32) -> Vec<GameEvent> {
        let dt_ms = dt_ms.clamp(0.0, MAX_FRAME_MS);
        self.clock_ms += f64::from(dt_ms);
        self.accumulator_ms += dt_ms;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator_ms >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            events.extend(self.step());
            self.accumulator_ms -= SIM_DT_MS;
            substeps += 1;
        }
        events
    }

    fn step(&mut self) -> Vec<GameEvent> {
        self.sync_physics();

        let (Some(state), Some(world)) = (self.director.game_state(), self.physics.as_mut()) else {
            return Vec::new();
        };
        let physics = world.step(state, SIM_DT_MS);
        let input = TickInput {
            intents: self.input.snapshot(),
            physics,
            autopilot: self.autopilot,
        };
        self.director.tick(&input, SIM_DT_MS)
    }

    /// Give every new run a fresh body and a clean input slate
    fn sync_physics(&mut self) {
        let runs = self.director.runs_started();
        match self.director.game_state() {
            Some(state) if self.physics.is_none() || self.physics_run != runs => {
                self.physics = Some(ArcadeWorld::new(state));
                self.physics_run = runs;
                self.input.reset();
                self.input.start();
            }
            Some(_) => {}
            None => {
                if self.physics.take().is_some() {
                    self.input.reset();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME_MS: f32 = 1000.0 / 60.0;

    fn run_frames(session: &mut Session, frames: usize) {
        for _ in 0..frames {
            session.frame(FRAME_MS);
        }
    }

    #[test]
    fn test_press_leaves_splash() {
        let mut session = Session::new(Tuning::default(), 1);
        session.handle_input(RawInput::KeyUp(Key::Space));
        assert_eq!(session.director().scene_kind(), SceneKind::Splash);
        session.handle_input(RawInput::PointerDown { id: 1, pos: Vec2::ZERO });
        assert_eq!(session.director().scene_kind(), SceneKind::Playing);
        assert!(session.hud().is_some());
    }

    #[test]
    fn test_frames_before_start_do_nothing() {
        let mut session = Session::new(Tuning::default(), 1);
        assert!(session.frame(FRAME_MS).is_empty());
        assert!(session.hud().is_none());
    }

    #[test]
    fn test_substeps_are_capped() {
        let mut session = Session::new(Tuning::default(), 2);
        session.director_mut().start_game();
        session.frame(10_000.0);
        let state = session.director().game_state().unwrap();
        assert!(state.now_ms <= f64::from(SIM_DT_MS) * MAX_SUBSTEPS as f64 + 1e-3);
    }

    #[test]
    fn test_player_walks_forward() {
        let mut session = Session::new(Tuning::default(), 3);
        session.director_mut().start_game();
        run_frames(&mut session, 120);
        let state = session.director().game_state().unwrap();
        assert!(state.player.pos.x > state.tuning.player_spawn_x() + 100.0);
        assert!(state.economy.score > 0);
        assert!(state.player.grounded);
    }

    #[test]
    fn test_autopilot_makes_progress() {
        let mut session = Session::new(Tuning::default(), 4);
        session.set_autopilot(true);
        session.director_mut().start_game();
        let ended = Rc::new(RefCell::new(None));
        let sink = ended.clone();
        session.subscribe(move |event| {
            if let SceneEvent::RunEnded { score, .. } = event {
                *sink.borrow_mut() = Some(*score);
            }
        });
        run_frames(&mut session, 60 * 20);

        // Distance bonus units, from the live run or the final breakdown
        let travelled = match session.director().game_state() {
            Some(state) => (state.economy.max_distance / state.tuning.distance_divisor).floor() as u64,
            None => ended.borrow().map(|score| score.distance_bonus).unwrap(),
        };
        assert!(travelled >= 8, "only reached {travelled}00px");
    }

    #[test]
    fn test_destroyed_body_ends_run() {
        let mut session = Session::new(Tuning::default(), 6);
        session.director_mut().start_game();
        run_frames(&mut session, 10);
        assert_eq!(session.director().runs_started(), 1);

        if let Some(world) = session.physics.as_mut() {
            world.destroy();
        }
        run_frames(&mut session, 1);
        assert!(matches!(session.director().scene_kind(), SceneKind::Won | SceneKind::Lost));
        // Finalized, not restarted
        assert_eq!(session.director().runs_started(), 1);
    }

    #[test]
    fn test_held_key_does_not_skip_end_screen() {
        let mut session = Session::new(Tuning::default(), 7);
        session.handle_input(RawInput::KeyDown(Key::Space));
        assert_eq!(session.director().scene_kind(), SceneKind::Playing);
        run_frames(&mut session, 1);
        if let Some(world) = session.physics.as_mut() {
            world.destroy();
        }
        run_frames(&mut session, 1);
        let ended = session.director().scene_kind();
        assert!(matches!(ended, SceneKind::Won | SceneKind::Lost));

        // Auto-repeat of the key held since the run
        session.handle_input(RawInput::KeyDown(Key::Space));
        assert_eq!(session.director().scene_kind(), ended);

        session.handle_input(RawInput::KeyUp(Key::Space));
        session.handle_input(RawInput::KeyDown(Key::Space));
        assert_eq!(session.director().scene_kind(), SceneKind::Playing);
        assert_eq!(session.director().runs_started(), 2);
    }

    #[test]
    fn test_run_always_ends_and_restarts() {
        let mut session = Session::new(Tuning::default(), 5);
        session.set_autopilot(true);
        session.director_mut().start_game();
        // Timer is 60s and survives restarts
        run_frames(&mut session, 60 * 65);
        let kind = session.director().scene_kind();
        assert!(matches!(kind, SceneKind::Won | SceneKind::Lost));
        assert!(session.frame(FRAME_MS).is_empty());

        session.handle_input(RawInput::KeyDown(Key::Space));
        let state = session.director().game_state().unwrap();
        assert_eq!(state.economy.lives, 3);
        assert_eq!(state.economy.score, 0);
    }
}
