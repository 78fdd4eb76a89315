//! Piston Runner - a side-scrolling auto-runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track generation, player, economy)
//! - `director`: Scene flow and the handoff between runs
//! - `session`: Fixed-step loop wiring input, physics, and scenes
//! - `hud`: Heads-up display view model
//! - `tuning`: Data-driven game balance

pub mod director;
pub mod handoff;
pub mod hud;
pub mod session;
pub mod sim;
pub mod tuning;

pub use director::{Scene, SceneDirector, SceneEvent, SceneKind};
pub use handoff::{Handoff, HandoffStore};
pub use hud::HudSnapshot;
pub use session::Session;
pub use tuning::{Tuning, TuningError};

/// Game loop constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz), in milliseconds
    pub const SIM_DT_MS: f32 = 1000.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted from the front end
    pub const MAX_FRAME_MS: f32 = 100.0;
}
