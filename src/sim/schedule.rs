//! Timed events
//!
//! Timers are entries in a min-heap keyed by due time. The session advances
//! its clock once per frame and drains everything due, so timer callbacks
//! never interleave with a frame half-way through.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::state::EntityId;

/// Something that happens at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    /// Periodic player damage check
    DamageTick,
    /// One intermission countdown step
    CountdownTick,
    /// Death clip finished; purge the enemy
    RemoveEnemy(EntityId),
    /// Game-over delay elapsed; start a new run
    ResetRun,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: f64,
    /// Insertion order breaks ties
    seq: u64,
    event: ScheduledEvent,
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
        self.due
            .total_cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Priority queue of timed events driven by an injected clock
#[derive(Debug, Default)]
pub struct Scheduler {
    now: f64,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock (seconds since session start)
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Schedule `event` to fire `delay` seconds from now
    pub fn schedule_in(&mut self, delay: f64, event: ScheduledEvent) {
        self.schedule_at(self.now + delay.max(0.0), event);
    }

    /// Schedule `event` at an absolute time. A time already past fires on
    /// the next [`Self::pop_due`], which lets periodic timers catch up
    /// after a long frame.
    pub fn schedule_at(&mut self, due: f64, event: ScheduledEvent) {
        self.seq += 1;
        self.queue.push(Reverse(Entry {
            due,
            seq: self.seq,
            event,
        }));
    }

    /// Advance the clock. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.now += dt;
        }
    }

    /// Pop the earliest event that is due, if any
    pub fn pop_due(&mut self) -> Option<(f64, ScheduledEvent)> {
        let Reverse(head) = self.queue.peek()?;
        if head.due > self.now {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        Some((entry.due, entry.event))
    }

    /// Drop every pending event matching `pred`
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&ScheduledEvent) -> bool) {
        self.queue.retain(|Reverse(e)| !pred(&e.event));
    }

    /// Drop everything pending
    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    /// Pending events matching `pred`, with their due times
    pub fn pending_where(&self, mut pred: impl FnMut(&ScheduledEvent) -> bool) -> Vec<(f64, ScheduledEvent)> {
        let mut out: Vec<_> = self
            .queue
            .iter()
            .filter(|Reverse(e)| pred(&e.event))
            .map(|Reverse(e)| (e.due, e.event))
            .collect();
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }
}
