//! Phase state machine and time formatting.
//!
//! The machine cycles Work -> Break -> Work without pausing between phases.
//! It owns no clock: every operation that needs the time takes `now`, and
//! the caller drives [`TimerState::tick`] on a fixed interval.

use std::time::{Duration, Instant};

use crate::models::{BreakKind, DisplayState, Phase, TimerEvent, WorkDuration};

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub remaining: Duration,
    pub progress: f32,
    pub events: Vec<TimerEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerState {
    phase: Phase,
    work_duration: WorkDuration,
    current_duration_secs: u32,
    running: bool,
    start_at: Option<Instant>,
    target_at: Option<Instant>,
    completed_work_sessions: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(WorkDuration::default())
    }
}

impl TimerState {
    /// Creates an idle timer in the Work phase.
    pub fn new(work_duration: WorkDuration) -> Self {
        Self {
            phase: Phase::Work,
            work_duration,
            current_duration_secs: work_duration.secs(),
            running: false,
            start_at: None,
            target_at: None,
            completed_work_sessions: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub fn work_duration(&self) -> WorkDuration {
        self.work_duration
    }

    #[cfg(test)]
    pub fn current_duration_secs(&self) -> u32 {
        self.current_duration_secs
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    #[cfg(test)]
    pub fn start_at(&self) -> Option<Instant> {
        self.start_at
    }

    #[cfg(test)]
    pub fn target_at(&self) -> Option<Instant> {
        self.target_at
    }

    /// The break kind in effect while in the Break phase.
    pub fn break_kind(&self) -> Option<BreakKind> {
        match self.phase {
            Phase::Work => None,
            Phase::Break => Some(BreakKind::after(self.completed_work_sessions)),
        }
    }

    /// Changes the focus duration. Only applies while idle in the Work phase.
    pub fn set_work_duration(&mut self, duration: WorkDuration) -> bool {
        if self.running || self.phase != Phase::Work {
            return false;
        }
        self.work_duration = duration;
        self.current_duration_secs = duration.secs();
        true
    }

    pub fn start(&mut self, now: Instant) -> Option<TimerEvent> {
        if self.running {
            return None;
        }
        self.running = true;
        if self.phase == Phase::Work {
            self.current_duration_secs = self.work_duration.secs();
        }
        self.arm(now);
        Some(self.started_event())
    }

    /// Stops the countdown. Timestamps are left in place but mean nothing
    /// until the next start.
    pub fn stop(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(TimerEvent::PhaseStopped { phase: self.phase })
    }

    /// Forces the running phase to expire on the next tick.
    pub fn skip(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        self.target_at = Some(now);
        true
    }

    /// Evaluates elapsed time and performs the phase-end transition when the
    /// target has been reached.
    pub fn tick(&mut self, now: Instant) -> Tick {
        let Some(target_at) = self.target_at.filter(|_| self.running) else {
            return Tick {
                remaining: Duration::from_secs(u64::from(self.current_duration_secs)),
                progress: 0.0,
                events: Vec::new(),
            };
        };

        let remaining = target_at.saturating_duration_since(now);
        let progress = progress_fraction(remaining, self.current_duration_secs);

        let mut events = Vec::new();
        if remaining.is_zero() {
            events.push(self.end_phase(now));
            events.push(self.started_event());
        }

        Tick {
            remaining,
            progress,
            events,
        }
    }

    /// Remaining time and progress as of `now`, without side effects.
    pub fn display_state(&self, now: Instant) -> DisplayState {
        let (remaining, progress) = match self.target_at.filter(|_| self.running) {
            Some(target_at) => {
                let remaining = target_at.saturating_duration_since(now);
                (remaining, progress_fraction(remaining, self.current_duration_secs))
            }
            None => (
                Duration::from_secs(u64::from(self.current_duration_secs)),
                0.0,
            ),
        };

        DisplayState {
            remaining_secs: remaining.as_secs() as u32,
            phase: self.phase,
            break_kind: self.break_kind(),
            progress,
            running: self.running,
            completed_work_sessions: self.completed_work_sessions,
            work_duration: self.work_duration,
        }
    }

    fn end_phase(&mut self, now: Instant) -> TimerEvent {
        let ended = self.phase;
        match ended {
            Phase::Work => {
                self.completed_work_sessions += 1;
                self.phase = Phase::Break;
                self.current_duration_secs =
                    BreakKind::after(self.completed_work_sessions).duration_secs();
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.current_duration_secs = self.work_duration.secs();
            }
        }
        self.arm(now);
        TimerEvent::PhaseEnded {
            phase: ended,
            completed_work_sessions: self.completed_work_sessions,
        }
    }

    fn arm(&mut self, now: Instant) {
        self.start_at = Some(now);
        self.target_at = Some(now + Duration::from_secs(u64::from(self.current_duration_secs)));
    }

    fn started_event(&self) -> TimerEvent {
        TimerEvent::PhaseStarted {
            phase: self.phase,
            break_kind: self.break_kind(),
            duration_secs: self.current_duration_secs,
        }
    }
}

/// Elapsed share of the phase, clamped to `[0, 1]`. A zero-length phase is
/// always complete.
pub fn progress_fraction(remaining: Duration, duration_secs: u32) -> f32 {
    if duration_secs == 0 {
        return 1.0;
    }
    let fraction = 1.0 - remaining.as_secs_f64() / f64::from(duration_secs);
    fraction.clamp(0.0, 1.0) as f32
}

/// Formats the tray title based on current timer state.
pub fn format_tray_title(state: &DisplayState) -> String {
    if !state.running {
        return "🍅".to_string();
    }
    match state.phase {
        Phase::Work => format!("🍅 {}", format_time(state.remaining_secs)),
        Phase::Break => format!("☕ {}", format_time(state.remaining_secs)),
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
