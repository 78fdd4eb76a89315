//! Intent resolution
//!
//! Raw keyboard and pointer events are folded into one `Intents` snapshot
//! per tick. Edge-triggered flags (tap jump, attack) are consumed by the
//! snapshot so nothing leaks into the following tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Jump while held
    Up,
    /// Attack on press
    Space,
    /// Run modifier while held
    Shift,
    Other,
}

/// Raw input from the platform layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown { id: u32, pos: Vec2 },
    PointerMove { id: u32, pos: Vec2 },
    PointerUp { id: u32, pos: Vec2 },
    /// Pointer left the canvas or the browser cancelled it
    PointerCancel { id: u32 },
}

/// Per-tick input intents consumed by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intents {
    /// Auto-run is on once a run starts
    pub move_right: bool,
    pub jump: bool,
    pub attack: bool,
    /// Run modifier held (shift)
    pub run: bool,
}

/// Drag direction of the primary pointer (tracked, not used for steering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragDirection {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    id: u32,
    start: Vec2,
    /// Cleared once the gesture turns into a drag
    down_at_ms: Option<f64>,
}

/// Folds raw events into intents
#[derive(Debug, Clone)]
pub struct InputTracker {
    drag_threshold: f32,
    tap_max_time_ms: f64,
    started: bool,
    jump_held: bool,
    run_held: bool,
    space_held: bool,
    active_pointers: Vec<u32>,
    gesture: Option<Gesture>,
    drag: DragDirection,
    tap_jump: bool,
    attack: bool,
}

impl InputTracker {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            drag_threshold: tuning.drag_threshold,
            tap_max_time_ms: tuning.tap_max_time_ms,
            started: false,
            jump_held: false,
            run_held: false,
            space_held: false,
            active_pointers: Vec::new(),
            gesture: None,
            drag: DragDirection::None,
            tap_jump: false,
            attack: false,
        }
    }

    /// Enable auto-run (called when a run begins)
    pub fn start(&mut self) {
        self.started = true;
    }

    /// Forget held keys, pointers, and pending edges (scene change)
    pub fn reset(&mut self) {
        self.jump_held = false;
        self.run_held = false;
        self.space_held = false;
        self.active_pointers.clear();
        self.gesture = None;
        self.drag = DragDirection::None;
        self.tap_jump = false;
        self.attack = false;
    }

    pub fn drag_direction(&self) -> DragDirection {
        self.drag
    }

    /// Feed one raw event observed at `now_ms`
    pub fn handle(&mut self, event: RawInput, now_ms: f64) {
        match event {
            RawInput::KeyDown(key) => match key {
                Key::Up => self.jump_held = true,
                Key::Shift => self.run_held = true,
                Key::Space => {
                    // Key repeat must not retrigger
                    if !self.space_held {
                        self.attack = true;
                    }
                    self.space_held = true;
                }
                Key::Other => {}
            },
            RawInput::KeyUp(key) => match key {
                Key::Up => self.jump_held = false,
                Key::Shift => self.run_held = false,
                Key::Space => self.space_held = false,
                Key::Other => {}
            },
            RawInput::PointerDown { id, pos } => {
                if !self.active_pointers.contains(&id) {
                    self.active_pointers.push(id);
                }
                if self.active_pointers.len() >= 2 {
                    log::debug!("Multi-touch attack ({} pointers)", self.active_pointers.len());
                    self.attack = true;
                    // A second finger ends any tap in progress
                    self.gesture = None;
                    return;
                }
                self.gesture = Some(Gesture {
                    id,
                    start: pos,
                    down_at_ms: Some(now_ms),
                });
                self.drag = DragDirection::None;
            }
            RawInput::PointerMove { id, pos } => {
                let threshold = self.drag_threshold;
                if let Some(gesture) = self.gesture.as_mut().filter(|g| g.id == id) {
                    let dx = pos.x - gesture.start.x;
                    if dx.abs() > threshold {
                        self.drag = if dx < 0.0 {
                            DragDirection::Left
                        } else {
                            DragDirection::Right
                        };
                        gesture.down_at_ms = None;
                    } else {
                        self.drag = DragDirection::None;
                    }
                }
            }
            RawInput::PointerUp { id, pos } => {
                self.active_pointers.retain(|&p| p != id);
                if let Some(gesture) = self.gesture.filter(|g| g.id == id) {
                    let quick = gesture
                        .down_at_ms
                        .is_some_and(|t| now_ms - t < self.tap_max_time_ms);
                    let still = gesture.start.distance(pos) < self.drag_threshold;
                    if quick && still {
                        log::debug!("Tap detected - jump");
                        self.tap_jump = true;
                    }
                    self.gesture = None;
                    self.drag = DragDirection::None;
                }
            }
            RawInput::PointerCancel { id } => {
                self.active_pointers.retain(|&p| p != id);
                if self.gesture.is_some_and(|g| g.id == id) {
                    self.gesture = None;
                    self.drag = DragDirection::None;
                }
            }
        }
    }

    /// Produce this tick's intents and consume edge-triggered flags
    pub fn snapshot(&mut self) -> Intents {
        let intents = Intents {
            move_right: self.started,
            jump: self.jump_held || self.tap_jump,
            attack: self.attack,
            run: self.run_held,
        };
        self.tap_jump = false;
        self.attack = false;
        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> InputTracker {
        let mut t = InputTracker::new(&Tuning::default());
        t.start();
        t
    }

    #[test]
    fn test_quick_tap_jumps_once() {
        let mut t = tracker();
        t.handle(RawInput::PointerDown { id: 1, pos: Vec2::new(100.0, 100.0) }, 0.0);
        t.handle(RawInput::PointerUp { id: 1, pos: Vec2::new(105.0, 102.0) }, 120.0);
        let first = t.snapshot();
        assert!(first.jump);
        assert!(first.move_right);
        assert!(!t.snapshot().jump, "tap jump must not leak into the next tick");
    }

    #[test]
    fn test_slow_press_is_not_a_tap() {
        let mut t = tracker();
        t.handle(RawInput::PointerDown { id: 1, pos: Vec2::ZERO }, 0.0);
        t.handle(RawInput::PointerUp { id: 1, pos: Vec2::ZERO }, 400.0);
        assert!(!t.snapshot().jump);
    }

    #[test]
    fn test_drag_cancels_tap() {
        let mut t = tracker();
        t.handle(RawInput::PointerDown { id: 1, pos: Vec2::ZERO }, 0.0);
        t.handle(RawInput::PointerMove { id: 1, pos: Vec2::new(-45.0, 0.0) }, 30.0);
        assert_eq!(t.drag_direction(), DragDirection::Left);
        // Finger comes back near the start; the gesture is still a drag
        t.handle(RawInput::PointerUp { id: 1, pos: Vec2::new(2.0, 0.0) }, 60.0);
        assert!(!t.snapshot().jump);
        assert_eq!(t.drag_direction(), DragDirection::None);
    }

    #[test]
    fn test_two_fingers_attack() {
        let mut t = tracker();
        t.handle(RawInput::PointerDown { id: 1, pos: Vec2::ZERO }, 0.0);
        t.handle(RawInput::PointerDown { id: 2, pos: Vec2::new(200.0, 0.0) }, 10.0);
        let intents = t.snapshot();
        assert!(intents.attack);
        assert!(!intents.jump);
        // Releasing the first finger quickly is no longer a tap
        t.handle(RawInput::PointerUp { id: 1, pos: Vec2::ZERO }, 50.0);
        assert!(!t.snapshot().jump);
        assert!(!t.snapshot().attack);
    }

    #[test]
    fn test_space_is_edge_triggered() {
        let mut t = tracker();
        t.handle(RawInput::KeyDown(Key::Space), 0.0);
        assert!(t.snapshot().attack);
        // Auto-repeat while held
        t.handle(RawInput::KeyDown(Key::Space), 30.0);
        assert!(!t.snapshot().attack);
        t.handle(RawInput::KeyUp(Key::Space), 60.0);
        t.handle(RawInput::KeyDown(Key::Space), 90.0);
        assert!(t.snapshot().attack);
    }

    #[test]
    fn test_held_keys_are_level_triggered() {
        let mut t = tracker();
        t.handle(RawInput::KeyDown(Key::Up), 0.0);
        t.handle(RawInput::KeyDown(Key::Shift), 0.0);
        for _ in 0..3 {
            let intents = t.snapshot();
            assert!(intents.jump);
            assert!(intents.run);
        }
        t.handle(RawInput::KeyUp(Key::Up), 10.0);
        assert!(!t.snapshot().jump);
    }

    #[test]
    fn test_move_right_only_after_start() {
        let mut t = InputTracker::new(&Tuning::default());
        assert!(!t.snapshot().move_right);
        t.start();
        assert!(t.snapshot().move_right);
    }

    #[test]
    fn test_reset_drops_pending_edges() {
        let mut t = tracker();
        t.handle(RawInput::KeyDown(Key::Space), 0.0);
        t.handle(RawInput::PointerDown { id: 4, pos: Vec2::ZERO }, 0.0);
        t.reset();
        assert!(!t.snapshot().attack);
        // The forgotten pointer no longer pairs up into a multi-touch
        t.handle(RawInput::PointerDown { id: 5, pos: Vec2::ZERO }, 10.0);
        assert!(!t.snapshot().attack);
    }
}
