//! Main application controller.
//!
//! Owns the timer, the scheduler that paces its ticks and the cue
//! dispatcher. Everything runs on the event-loop thread.

use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::audio::{CueDispatcher, CuePlayer, BELL_RELEASE_AFTER};
use crate::clock::Clock;
use crate::models::{DisplayState, TimerEvent, WorkDuration};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::timer::TimerState;

/// Delay between two ticks of a running timer.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Deferred work owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Tick,
    ReleaseBells,
}

pub struct App<C, P> {
    clock: C,
    timer: TimerState,
    scheduler: Scheduler<Job>,
    tick_handle: Option<TimerHandle>,
    cues: CueDispatcher<P>,
}

impl<C: Clock, P: CuePlayer> App<C, P> {
    pub fn new(clock: C, work_duration: WorkDuration, cues: CueDispatcher<P>) -> Self {
        Self {
            clock,
            timer: TimerState::new(work_duration),
            scheduler: Scheduler::new(),
            tick_handle: None,
            cues,
        }
    }

    #[cfg(test)]
    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn display_state(&self) -> DisplayState {
        self.timer.display_state(self.clock.now())
    }

    /// When the event loop should wake up next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn start(&mut self) -> Vec<TimerEvent> {
        let now = self.clock.now();
        let Some(event) = self.timer.start(now) else {
            return Vec::new();
        };
        info!(phase = ?self.timer.phase(), "timer started");
        let events = vec![event];
        self.dispatch(&events, now);
        self.schedule_tick(now);
        events
    }

    pub fn stop(&mut self) -> Vec<TimerEvent> {
        let now = self.clock.now();
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        let Some(event) = self.timer.stop() else {
            return Vec::new();
        };
        info!(phase = ?self.timer.phase(), "timer stopped");
        let events = vec![event];
        self.dispatch(&events, now);
        events
    }

    /// Ends the current phase at the next tick.
    pub fn skip(&mut self) {
        if self.timer.skip(self.clock.now()) {
            debug!(phase = ?self.timer.phase(), "phase skipped");
        }
    }

    pub fn set_work_duration(&mut self, duration: WorkDuration) -> bool {
        let applied = self.timer.set_work_duration(duration);
        if applied {
            info!(minutes = duration.minutes(), "work duration changed");
        }
        applied
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.cues.set_muted(muted);
    }

    /// Runs every job that has come due and returns the transition events
    /// they produced.
    pub fn run_due(&mut self) -> Vec<TimerEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();
        for job in self.scheduler.take_due(now) {
            match job {
                Job::Tick => {
                    self.tick_handle = None;
                    events.extend(self.tick(now));
                }
                Job::ReleaseBells => self.cues.release_bells(now),
            }
        }
        events
    }

    fn tick(&mut self, now: Instant) -> Vec<TimerEvent> {
        let tick = self.timer.tick(now);
        trace!(remaining = ?tick.remaining, progress = tick.progress, "tick");
        if !tick.events.is_empty() {
            info!(
                phase = ?self.timer.phase(),
                completed = self.timer.completed_work_sessions(),
                "phase changed"
            );
            self.dispatch(&tick.events, now);
        }
        if self.timer.is_running() {
            self.schedule_tick(now);
        }
        tick.events
    }

    fn dispatch(&mut self, events: &[TimerEvent], now: Instant) {
        for event in events {
            if self.cues.dispatch(event, now) {
                self.scheduler
                    .schedule(now, BELL_RELEASE_AFTER, Job::ReleaseBells);
            }
        }
    }

    fn schedule_tick(&mut self, now: Instant) {
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.tick_handle = Some(self.scheduler.schedule(now, TICK_INTERVAL, Job::Tick));
    }

    #[cfg(test)]
    pub fn cues(&self) -> &CueDispatcher<P> {
        &self.cues
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &Scheduler<Job> {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Call, RecordingPlayer};
    use crate::clock::ManualClock;
    use crate::models::{BreakKind, Phase};

    fn create_test_app() -> (App<ManualClock, RecordingPlayer>, ManualClock) {
        let clock = ManualClock::new();
        let cues = CueDispatcher::new(Some(RecordingPlayer::default()));
        let app = App::new(clock.clone(), WorkDuration::default(), cues);
        (app, clock)
    }

    /// Advances the clock tick by tick until `total` has elapsed.
    fn run_for(
        app: &mut App<ManualClock, RecordingPlayer>,
        clock: &ManualClock,
        total: Duration,
    ) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            clock.advance(TICK_INTERVAL);
            elapsed += TICK_INTERVAL;
            events.extend(app.run_due());
        }
        events
    }

    fn player_calls(app: &App<ManualClock, RecordingPlayer>) -> Vec<Call> {
        app.cues().player().unwrap().calls.clone()
    }

    #[test]
    fn test_app_initial_state() {
        let (app, _) = create_test_app();
        let state = app.display_state();

        assert!(!state.running);
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.remaining_secs, 1500);
        assert_eq!(state.completed_work_sessions, 0);
        assert_eq!(app.next_deadline(), None);
    }

    #[test]
    fn test_start_schedules_tick_and_plays_ambient() {
        let (mut app, clock) = create_test_app();
        let events = app.start();

        assert_eq!(events.len(), 1);
        assert_eq!(app.next_deadline(), Some(clock.now() + TICK_INTERVAL));
        assert_eq!(player_calls(&app), vec![Call::StartAmbient]);
    }

    #[test]
    fn test_ticks_are_rescheduled_one_at_a_time() {
        let (mut app, clock) = create_test_app();
        app.start();

        run_for(&mut app, &clock, Duration::from_secs(3));
        assert_eq!(app.scheduler().len(), 1);
        assert_eq!(app.display_state().remaining_secs, 1497);
    }

    #[test]
    fn test_late_wakeup_runs_a_single_tick() {
        let (mut app, clock) = create_test_app();
        app.start();

        clock.advance(Duration::from_secs(10));
        assert!(app.run_due().is_empty());
        assert_eq!(app.scheduler().len(), 1);
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let (mut app, clock) = create_test_app();
        app.start();
        let events = app.stop();

        assert_eq!(events, vec![TimerEvent::PhaseStopped { phase: Phase::Work }]);
        assert_eq!(app.next_deadline(), None);

        clock.advance(Duration::from_secs(2000));
        assert!(app.run_due().is_empty());
        assert_eq!(app.display_state().phase, Phase::Work);
    }

    #[test]
    fn test_stop_twice_has_no_extra_side_effects() {
        let (mut app, _) = create_test_app();
        app.start();
        app.stop();
        assert!(app.stop().is_empty());

        assert!(!app.display_state().running);
        assert_eq!(
            player_calls(&app),
            vec![Call::StartAmbient, Call::StopAmbient]
        );
    }

    #[test]
    fn test_restart_after_stop_uses_fresh_timestamps() {
        let (mut app, clock) = create_test_app();
        app.start();
        clock.advance(Duration::from_secs(600));
        app.stop();
        clock.advance(Duration::from_secs(1200));
        app.start();

        // The old target (t+1500s) has passed; the new one has not.
        assert!(run_for(&mut app, &clock, Duration::from_secs(1)).is_empty());
        assert_eq!(app.display_state().remaining_secs, 1499);
    }

    #[test]
    fn test_full_work_session_transitions_to_break() {
        let (mut app, clock) = create_test_app();
        app.start();

        let events = run_for(&mut app, &clock, Duration::from_secs(1500));
        let state = app.display_state();

        assert_eq!(
            events,
            vec![
                TimerEvent::PhaseEnded {
                    phase: Phase::Work,
                    completed_work_sessions: 1,
                },
                TimerEvent::PhaseStarted {
                    phase: Phase::Break,
                    break_kind: Some(BreakKind::Short),
                    duration_secs: 300,
                },
            ]
        );
        assert_eq!(state.completed_work_sessions, 1);
        assert_eq!(state.phase, Phase::Break);
        assert_eq!(state.remaining_secs, 300);
        assert!(state.running);
        assert_eq!(
            player_calls(&app),
            vec![Call::StartAmbient, Call::StopAmbient, Call::RingBell]
        );
    }

    #[test]
    fn test_skip_ends_phase_on_next_tick() {
        let (mut app, clock) = create_test_app();
        app.start();
        clock.advance(Duration::from_millis(20));
        app.skip();

        // Skip is deferred: nothing happened yet.
        assert_eq!(app.display_state().phase, Phase::Work);

        let events = run_for(&mut app, &clock, TICK_INTERVAL);
        assert!(events.contains(&TimerEvent::PhaseEnded {
            phase: Phase::Work,
            completed_work_sessions: 1,
        }));
        assert_eq!(app.display_state().phase, Phase::Break);
    }

    #[test]
    fn test_skip_while_idle_is_ignored() {
        let (mut app, clock) = create_test_app();
        app.skip();
        clock.advance(Duration::from_secs(1));

        assert!(app.run_due().is_empty());
        assert!(!app.display_state().running);
    }

    #[test]
    fn test_bell_is_released_after_ceiling() {
        let (mut app, clock) = create_test_app();
        app.start();
        app.skip();
        run_for(&mut app, &clock, TICK_INTERVAL);

        assert_eq!(app.cues().player().unwrap().count(&Call::ReleaseBells), 0);
        run_for(&mut app, &clock, BELL_RELEASE_AFTER);
        assert_eq!(app.cues().player().unwrap().count(&Call::ReleaseBells), 1);
    }

    #[test]
    fn test_long_break_after_four_sessions() {
        let (mut app, clock) = create_test_app();
        app.start();

        let mut breaks = Vec::new();
        for _ in 0..4 {
            app.skip();
            run_for(&mut app, &clock, TICK_INTERVAL);
            breaks.push(app.display_state().break_kind);
            app.skip();
            run_for(&mut app, &clock, TICK_INTERVAL);
        }

        assert_eq!(
            breaks,
            vec![
                Some(BreakKind::Short),
                Some(BreakKind::Short),
                Some(BreakKind::Short),
                Some(BreakKind::Long),
            ]
        );
        assert_eq!(app.display_state().completed_work_sessions, 4);
    }

    #[test]
    fn test_set_work_duration_only_while_idle() {
        let (mut app, _) = create_test_app();
        assert!(app.set_work_duration(WorkDuration::Thirty));
        assert_eq!(app.display_state().remaining_secs, 1800);

        app.start();
        assert!(!app.set_work_duration(WorkDuration::ThirtyFive));
        assert_eq!(app.timer().current_duration_secs(), 1800);
    }

    #[test]
    fn test_muted_app_keeps_timing() {
        let (mut app, clock) = create_test_app();
        app.set_muted(true);
        app.start();
        app.skip();
        let events = run_for(&mut app, &clock, TICK_INTERVAL);

        assert_eq!(events.len(), 2);
        assert!(player_calls(&app).is_empty());
    }
}
