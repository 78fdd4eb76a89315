//! Scene director
//!
//! Owns the scene flow (splash, gameplay, win, lose), the handoff slot
//! between runs, and the observers that want to hear about transitions.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::handoff::{Handoff, HandoffStore};
use crate::sim::{FinalScore, GameEvent, GameState, RunPhase, TickInput, tick};
use crate::tuning::Tuning;

/// Which scene is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneKind {
    Splash,
    Playing,
    Won,
    Lost,
}

/// Scene plus whatever it needs to show
#[derive(Debug, Clone)]
pub enum Scene {
    Splash,
    Playing(Box<GameState>),
    Won(FinalScore),
    Lost(FinalScore),
}

impl Scene {
    pub fn kind(&self) -> SceneKind {
        match self {
            Scene::Splash => SceneKind::Splash,
            Scene::Playing(_) => SceneKind::Playing,
            Scene::Won(_) => SceneKind::Won,
            Scene::Lost(_) => SceneKind::Lost,
        }
    }
}

/// Notification sent to observers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    /// A scene finished setting up
    Ready(SceneKind),
    RunStarted(Handoff),
    RunEnded { score: FinalScore, won: bool },
}

type Observer = Box<dyn FnMut(&SceneEvent)>;

/// Drives scene transitions around the simulation core
pub struct SceneDirector {
    tuning: Tuning,
    scene: Scene,
    handoff: HandoffStore,
    rng: Pcg32,
    observers: Vec<Observer>,
    runs_started: u64,
}

impl SceneDirector {
    /// Start on the splash scene; invalid tuning falls back to defaults
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(err) => {
                log::warn!("{}; using default tuning", err);
                Tuning::default()
            }
        };
        Self {
            handoff: HandoffStore::new(Handoff::fresh(&tuning)),
            tuning,
            scene: Scene::Splash,
            rng: Pcg32::seed_from_u64(seed),
            observers: Vec::new(),
            runs_started: 0,
        }
    }

    /// Register a scene observer
    pub fn subscribe(&mut self, observer: impl FnMut(&SceneEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: SceneEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_kind(&self) -> SceneKind {
        self.scene.kind()
    }

    pub fn game_state(&self) -> Option<&GameState> {
        match &self.scene {
            Scene::Playing(state) => Some(&**state),
            _ => None,
        }
    }

    pub fn game_state_mut(&mut self) -> Option<&mut GameState> {
        match &mut self.scene {
            Scene::Playing(state) => Some(&mut **state),
            _ => None,
        }
    }

    pub fn handoff(&self) -> &HandoffStore {
        &self.handoff
    }

    /// Runs started since the director was created (restarts included)
    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    /// Leave the splash scene
    pub fn start_game(&mut self) {
        if self.scene_kind() != SceneKind::Splash {
            return;
        }
        log::info!("Starting game from splash");
        self.start_run();
    }

    /// Begin a run from the handoff slot (defaults if empty)
    pub fn start_run(&mut self) {
        let handoff = self.handoff.read_and_clear();
        let seed = self.rng.random::<u64>();
        let state = GameState::new(self.tuning.clone(), seed, &handoff);
        self.scene = Scene::Playing(Box::new(state));
        self.runs_started += 1;
        self.emit(SceneEvent::RunStarted(handoff));
        self.emit(SceneEvent::Ready(SceneKind::Playing));
    }

    /// Show the win or lose scene
    pub fn end_run(&mut self, score: FinalScore, won: bool) {
        log::info!(
            "Run ended with {} points, showing {} scene",
            score.total,
            if won { "win" } else { "lose" }
        );
        self.scene = if won { Scene::Won(score) } else { Scene::Lost(score) };
        let kind = self.scene_kind();
        self.emit(SceneEvent::RunEnded { score, won });
        self.emit(SceneEvent::Ready(kind));
    }

    /// Play again from the win or lose scene with fresh values
    pub fn restart(&mut self) {
        if !matches!(self.scene_kind(), SceneKind::Won | SceneKind::Lost) {
            return;
        }
        self.handoff.write_defaults();
        self.start_run();
    }

    /// Tick the active run and follow any transition it asks for
    pub fn tick(&mut self, input: &TickInput, dt_ms: f32) -> Vec<GameEvent> {
        let Scene::Playing(state) = &mut self.scene else {
            return Vec::new();
        };
        let events = tick(state, input, dt_ms);

        let phase = state.phase;
        match phase {
            RunPhase::Running => {}
            RunPhase::Restarting(handoff) => {
                self.handoff.write(handoff);
                self.start_run();
            }
            RunPhase::Finished { score, won } => self.end_run(score, won),
        }
        events
    }
}
