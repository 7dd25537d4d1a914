//! Data models shared by the timer, renderer and presentation layer.

use serde::{Deserialize, Serialize};

/// Length of a short break in seconds.
pub const SHORT_BREAK_SECS: u32 = 5 * 60;
/// Length of a long break in seconds.
pub const LONG_BREAK_SECS: u32 = 15 * 60;
/// Every n-th completed work session earns a long break.
pub const SESSIONS_PER_LONG_BREAK: u32 = 4;

/// The two timer modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Work,
    Break,
}

/// Break length, decided when a work session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Short,
    Long,
}

impl BreakKind {
    /// The break earned once `completed` work sessions are done.
    pub fn after(completed: u32) -> Self {
        if completed > 0 && completed % SESSIONS_PER_LONG_BREAK == 0 {
            Self::Long
        } else {
            Self::Short
        }
    }

    pub fn duration_secs(self) -> u32 {
        match self {
            Self::Short => SHORT_BREAK_SECS,
            Self::Long => LONG_BREAK_SECS,
        }
    }
}

/// The fixed set of selectable focus durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum WorkDuration {
    #[default]
    TwentyFive,
    Thirty,
    ThirtyFive,
}

impl WorkDuration {
    pub const ALL: [WorkDuration; 3] = [Self::TwentyFive, Self::Thirty, Self::ThirtyFive];

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            25 => Some(Self::TwentyFive),
            30 => Some(Self::Thirty),
            35 => Some(Self::ThirtyFive),
            _ => None,
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::TwentyFive => 25,
            Self::Thirty => 30,
            Self::ThirtyFive => 35,
        }
    }

    pub fn secs(self) -> u32 {
        self.minutes() * 60
    }
}

impl TryFrom<u32> for WorkDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
            .ok_or_else(|| format!("work duration must be 25, 30 or 35 minutes, got {minutes}"))
    }
}

impl From<WorkDuration> for u32 {
    fn from(duration: WorkDuration) -> Self {
        duration.minutes()
    }
}

/// Transition events emitted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A phase began counting down.
    PhaseStarted {
        phase: Phase,
        break_kind: Option<BreakKind>,
        duration_secs: u32,
    },
    /// A phase ran out, naturally or through skip.
    PhaseEnded {
        phase: Phase,
        completed_work_sessions: u32,
    },
    /// The user stopped the running phase.
    PhaseStopped { phase: Phase },
}

/// Snapshot handed to the presentation layer for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayState {
    pub remaining_secs: u32,
    pub phase: Phase,
    pub break_kind: Option<BreakKind>,
    pub progress: f32,
    pub running: bool,
    pub completed_work_sessions: u32,
    pub work_duration: WorkDuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_kind_every_fourth_session_is_long() {
        let kinds: Vec<_> = (1..=8).map(BreakKind::after).collect();
        assert_eq!(
            kinds,
            vec![
                BreakKind::Short,
                BreakKind::Short,
                BreakKind::Short,
                BreakKind::Long,
                BreakKind::Short,
                BreakKind::Short,
                BreakKind::Short,
                BreakKind::Long,
            ]
        );
    }

    #[test]
    fn test_break_kind_before_any_session_is_short() {
        assert_eq!(BreakKind::after(0), BreakKind::Short);
    }

    #[test]
    fn test_break_durations() {
        assert_eq!(BreakKind::Short.duration_secs(), 300);
        assert_eq!(BreakKind::Long.duration_secs(), 900);
    }

    #[test]
    fn test_work_duration_fixed_set() {
        for minutes in [25, 30, 35] {
            let duration = WorkDuration::from_minutes(minutes).unwrap();
            assert_eq!(duration.minutes(), minutes);
            assert_eq!(duration.secs(), minutes * 60);
        }
        assert_eq!(WorkDuration::from_minutes(0), None);
        assert_eq!(WorkDuration::from_minutes(45), None);
        assert_eq!(WorkDuration::default(), WorkDuration::TwentyFive);
    }

    #[test]
    fn test_work_duration_deserializes_from_minutes() {
        let duration: WorkDuration = serde_json::from_str("30").unwrap();
        assert_eq!(duration, WorkDuration::Thirty);
        assert!(serde_json::from_str::<WorkDuration>("40").is_err());
        assert_eq!(serde_json::to_string(&WorkDuration::ThirtyFive).unwrap(), "35");
    }
}
