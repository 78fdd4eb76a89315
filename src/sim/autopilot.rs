//! Demo AI that plays a run on its own
//!
//! Runs with shift held and swings at anything inside the attack hitbox.
//! Jumps off the end of every segment not followed by level ground, and
//! whenever an obstacle has it stuck.

use super::collision::attack_hitbox;
use super::input::Intents;
use super::state::{GameState, TrackSegment};

/// How close a body's bottom must be to a segment top to count as standing on it
const SUPPORT_TOLERANCE: f32 = 4.0;

/// Intents the autopilot would send this tick
pub fn autopilot_intents(state: &GameState) -> Intents {
    let player = &state.player;
    let body = player.bounds();
    let mut intents = Intents {
        move_right: true,
        run: true,
        ..Default::default()
    };

    if !player.attacking {
        let hitbox = attack_hitbox(&body);
        intents.attack = state
            .obstacles
            .iter()
            .any(|o| o.is_alive() && o.hitbox().intersects(&hitbox));
    }

    if player.grounded && !player.attacking {
        let support = state
            .segments
            .iter()
            .filter(|s| {
                s.left() < body.right()
                    && s.right() > body.left()
                    && (s.top() - body.bottom()).abs() < SUPPORT_TOLERANCE
            })
            .max_by(|a, b| a.right().total_cmp(&b.right()));

        if let Some(support) = support {
            let next = state.segments.iter().find(|s| s.left() >= support.right() - 0.5);
            if body.center.x >= support.right() && !continues_level(support, next) {
                intents.jump = true;
            }
        }
        // Hop over whatever we're stuck against
        if state.economy.blocked_by_obstacle {
            intents.jump = true;
        }
    }

    intents
}

/// Next segment picks up flush with the current one
fn continues_level(current: &TrackSegment, next: Option<&TrackSegment>) -> bool {
    next.is_some_and(|n| n.left() - current.right() < 1.0 && (n.top() - current.top()).abs() < 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::Handoff;
    use crate::sim::state::{Obstacle, ObstacleState};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn state() -> GameState {
        let mut state = GameState::new(Tuning::default(), 8, &Handoff::default());
        state.obstacles.clear();
        state
    }

    #[test]
    fn test_always_runs_right() {
        let intents = autopilot_intents(&state());
        assert!(intents.move_right);
        assert!(intents.run);
        assert!(!intents.jump);
        assert!(!intents.attack);
    }

    #[test]
    fn test_attacks_obstacle_in_reach() {
        let mut s = state();
        let id = s.next_entity_id();
        s.obstacles.push(Obstacle {
            id,
            pos: Vec2::new(s.player.bounds().right() + 40.0, s.player.pos.y - 30.0),
            size: 120.0,
            state: ObstacleState::Alive,
        });
        assert!(autopilot_intents(&s).attack);

        s.obstacles[0].state = ObstacleState::Defeated { at_ms: 0.0 };
        assert!(!autopilot_intents(&s).attack);
    }

    #[test]
    fn test_jumps_at_gap_edge() {
        let mut s = state();
        // Last ground piece before the first real gap
        let edge = s.segments[s.segments.len() - 1].right();
        s.player.pos.x = edge + 1.0;
        assert!(autopilot_intents(&s).jump);

        // Mid-way along contiguous ground: no jump
        s.player.pos.x = s.segments[1].right();
        assert!(!autopilot_intents(&s).jump);
    }
}
