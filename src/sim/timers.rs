//! Deadline-ordered delay queue
//!
//! Deferred effects (obstacle removal, power-up charge expiry, popup
//! cleanup) are queued with an absolute deadline and drained once per tick.
//! Ties fire in insertion order so replays stay deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// An effect that fires once its deadline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredEffect {
    /// Remove a defeated obstacle after its exit animation
    RemoveObstacle(u32),
    /// Remove a collected power-up after its collect effect
    RemovePowerup(u32),
    /// Drop one power-up charge
    ExpireCharge,
    /// Remove a floating score popup
    RemovePopup(u32),
}

#[derive(Debug, Clone)]
struct Entry {
    deadline_ms: f64,
    seq: u64,
    effect: DeferredEffect,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline_ms
            .total_cmp(&other.deadline_ms)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of deferred effects keyed by deadline
#[derive(Debug, Clone, Default)]
pub struct DelayQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl DelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `effect` to fire at `deadline_ms`
    pub fn schedule(&mut self, deadline_ms: f64, effect: DeferredEffect) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            deadline_ms,
            seq,
            effect,
        }));
    }

    /// Pop every effect whose deadline is at or before `now_ms`
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<DeferredEffect> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.deadline_ms > now_ms {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.effect);
            }
        }
        due
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_in_deadline_order() {
        let mut q = DelayQueue::new();
        q.schedule(300.0, DeferredEffect::RemovePopup(3));
        q.schedule(100.0, DeferredEffect::RemovePopup(1));
        q.schedule(200.0, DeferredEffect::RemovePopup(2));

        assert!(q.drain_due(50.0).is_empty());
        assert_eq!(q.drain_due(250.0), vec![
            DeferredEffect::RemovePopup(1),
            DeferredEffect::RemovePopup(2),
        ]);
        assert!(q.drain_due(299.9).is_empty());
        assert_eq!(q.drain_due(300.0), vec![DeferredEffect::RemovePopup(3)]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut q = DelayQueue::new();
        q.schedule(100.0, DeferredEffect::ExpireCharge);
        q.schedule(100.0, DeferredEffect::RemoveObstacle(7));
        q.schedule(100.0, DeferredEffect::RemovePowerup(9));
        assert_eq!(q.drain_due(100.0), vec![
            DeferredEffect::ExpireCharge,
            DeferredEffect::RemoveObstacle(7),
            DeferredEffect::RemovePowerup(9),
        ]);
    }
}
