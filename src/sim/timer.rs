//! Scheduler abstraction and the manual-clock timer queue
//!
//! Every delayed step of a round is a tagged `Timer` handed to a
//! `Scheduler`. The queue never fires anything by itself; the owner pops
//! due timers and feeds them back into the sequencer.

/// Delayed steps of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Sway reached its confirm mark
    ConfirmStart,
    /// Confirm nod finished
    ConfirmSettled,
    /// Treat tween reached the cat
    TreatLanded,
    /// Chewing finished
    ChewDone,
    /// Happy pose finished
    HappyHoldDone,
}

/// A scheduled step, tagged with the round it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub round: u64,
    pub event: TimerEvent,
}

impl Timer {
    pub fn new(round: u64, event: TimerEvent) -> Self {
        Self { round, event }
    }
}

/// `after(seconds, timer)` style scheduler
pub trait Scheduler {
    /// Current time in seconds
    fn now(&self) -> f64;
    /// Fire `timer` once, `seconds` from now
    fn after(&mut self, seconds: f64, timer: Timer);
    /// Drop every pending timer
    fn cancel_all(&mut self);
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: f64,
    seq: u64,
    timer: Timer,
}

/// Deterministic timer queue driven by an external clock
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now: f64,
    next_seq: u64,
    pending: Vec<Pending>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<f64> {
        self.earliest().map(|i| self.pending[i].due)
    }

    /// Remove the earliest timer due at or before `until`, advancing the
    /// clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: f64) -> Option<(f64, Timer)> {
        let idx = self.earliest()?;
        if self.pending[idx].due > until {
            return None;
        }
        let p = self.pending.remove(idx);
        self.now = self.now.max(p.due);
        Some((p.due, p.timer))
    }

    /// Move the clock forward (never backward)
    pub fn advance_to(&mut self, t: f64) {
        if t > self.now {
            self.now = t;
        }
    }

    fn earliest(&self) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.due
                    .partial_cmp(&b.due)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|(i, _)| i)
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> f64 {
        self.now
    }

    fn after(&mut self, seconds: f64, timer: Timer) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due: self.now + seconds.max(0.0),
            seq,
            timer,
        });
    }

    fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelling {} pending timers", self.pending.len());
        }
        self.pending.clear();
    }
}
