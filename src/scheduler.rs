//! Cancellable one-shot deadlines for the event loop.
//!
//! The scheduler never sleeps or spawns threads. The event loop asks for
//! [`Scheduler::next_deadline`], waits until then, and collects whatever has
//! come due with [`Scheduler::take_due`].

use std::time::{Duration, Instant};

/// Handle returned by [`Scheduler::schedule`], used to cancel the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Pending<J> {
    handle: TimerHandle,
    deadline: Instant,
    job: J,
}

#[derive(Debug)]
pub struct Scheduler<J> {
    next_id: u64,
    pending: Vec<Pending<J>>,
}

impl<J> Default for Scheduler<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J> Scheduler<J> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Schedules `job` to come due `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, job: J) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            deadline: now + delay,
            job,
        });
        handle
    }

    /// Cancels a pending job. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    #[cfg(test)]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    /// Removes and returns every job whose deadline is at or before `now`,
    /// earliest first. Jobs with equal deadlines keep scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<J> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.deadline <= now);
        self.pending = rest;
        due.sort_by_key(|p| (p.deadline, p.handle.0));
        due.into_iter().map(|p| p.job).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
