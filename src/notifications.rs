//! Desktop notifications for phase changes.

use notify_rust::Notification;
use std::thread;
use tracing::warn;

use crate::models::{BreakKind, Phase, TimerEvent};

const APP_NAME: &str = "Cosy Focus";

/// Title and body for the notification announcing `event`, if any.
pub fn message_for(event: &TimerEvent) -> Option<(&'static str, String)> {
    match *event {
        TimerEvent::PhaseStarted {
            phase: Phase::Break,
            break_kind,
            ..
        } => Some(match break_kind {
            Some(BreakKind::Long) => ("Break", "Long break: breathe for 15 min 🌙".to_string()),
            _ => ("Break", "Short break: 5 min, move a little 🧘".to_string()),
        }),
        TimerEvent::PhaseStarted {
            phase: Phase::Work,
            duration_secs,
            ..
        } => Some((
            "Focus",
            format!("Back to {} min of focus 💡", duration_secs / 60),
        )),
        _ => None,
    }
}

/// Announces a phase that started after a transition.
/// Runs in a background thread to avoid blocking.
pub fn notify_transition(event: &TimerEvent) {
    let Some((summary, body)) = message_for(event) else {
        return;
    };
    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .appname(APP_NAME)
            .summary(summary)
            .body(&body)
            .show()
        {
            warn!(error = %e, "failed to show notification");
        }
    });
}

/// Blocking notice shown before exiting when no audio device is available.
pub fn notify_audio_unavailable(reason: &str) {
    if let Err(e) = Notification::new()
        .appname(APP_NAME)
        .summary("Audio unavailable")
        .body(&format!(
            "No audio output could be opened ({reason}). Set \"require_audio\": false to run silently."
        ))
        .show()
    {
        warn!(error = %e, "failed to show notification");
    }
}
