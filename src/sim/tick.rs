//! Per-frame simulation tick
//!
//! Physics is owned by the host engine. Each tick receives what physics
//! observed (body state, contacts, overlaps) along with the player's
//! intents. It advances the run and returns the effects the host should
//! apply, leaving the commanded player velocity in `state.player.vel`.

use serde::{Deserialize, Serialize};

use super::autopilot::autopilot_intents;
use super::economy::ScoreChange;
use super::events::{Animation, GameEvent};
use super::input::Intents;
use super::player::{BodySample, select_speed};
use super::state::GameState;

/// What the physics layer observed since the last tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsReport {
    /// `None` until the engine has created the player body
    pub body: Option<BodySample>,
    /// Obstacles the player body collided with
    pub obstacle_contacts: Vec<u32>,
    /// Power-ups overlapping the player body
    pub powerup_overlaps: Vec<u32>,
    /// The attack animation played to its end
    pub attack_animation_complete: bool,
    /// Camera scroll if the engine drives the camera itself
    pub camera_scroll_x: Option<f32>,
}

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub intents: Intents,
    pub physics: PhysicsReport,
    /// Demo mode: the autopilot replaces `intents`
    pub autopilot: bool,
}

/// Advance the run by `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if !state.is_running() {
        return events;
    }
    // Nothing to drive until the engine has a body for us
    let Some(body) = input.physics.body else {
        return events;
    };

    let dt = f64::from(dt_ms.max(0.0));
    state.now_ms += dt;
    let now = state.now_ms;

    if !body.active {
        log::warn!("Player entity destroyed, ending run");
        state.finish(&mut events);
        return events;
    }

    // Sync with physics
    if input.physics.attack_animation_complete && state.player.finish_attack() {
        events.push(GameEvent::AttackFinished);
    }
    state.player.sync_body(&body, now);
    state.camera_scroll_x = input
        .physics
        .camera_scroll_x
        .unwrap_or_else(|| state.follow_camera());

    state.run_deferred(&mut events);

    for &id in &input.physics.powerup_overlaps {
        state.collect_powerup(id, &mut events);
    }
    for &id in &input.physics.obstacle_contacts {
        state.handle_obstacle_contact(id, &mut events);
    }
    state.update_superstar(&mut events);

    // Clock and distance
    let out_of_time = state.economy.tick_clock(dt);
    state.economy.track_distance(state.player.pos.x);
    if out_of_time {
        log::info!("Time's up");
        state.finish(&mut events);
        return events;
    }

    let x = state.player.pos.x;
    if let Some(ScoreChange::Penalty(points)) = state.economy.score_progress(x, now, &state.tuning) {
        log::trace!(
            "Stalled: -{} (blocked={})",
            points,
            state.economy.blocked_by_obstacle
        );
    }

    // Player
    let intents = if input.autopilot {
        autopilot_intents(state)
    } else {
        input.intents
    };
    let powered = state.is_powered();

    if intents.jump {
        state.player.buffer_jump(now);
    }

    if intents.attack && state.player.try_begin_attack() {
        events.push(GameEvent::AnimationChanged(Animation::Attack));
        state.attack_sweep(&mut events);
    }

    let speed = if intents.move_right {
        select_speed(powered, intents.run, &state.tuning)
    } else {
        0.0
    };
    let running = powered || intents.run;
    if let Some(animation) = state.player.update_locomotion(speed, running, now, &state.tuning) {
        events.push(GameEvent::AnimationChanged(animation));
    }

    if let Some(mid_air) = state.player.try_jump(now, &state.tuning) {
        events.push(GameEvent::Jumped { mid_air });
    }

    // World upkeep
    state.extend_track(&mut events);
    state.retire_behind_camera(&mut events);

    let fall_line = state.tuning.world_bottom() - state.tuning.fall_margin;
    if state.player.bounds().bottom() > fall_line {
        log::debug!("Fell off the world at x={:.0}", state.player.pos.x);
        state.lose_life(&mut events);
    }

    events
}
