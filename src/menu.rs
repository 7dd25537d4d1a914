//! Menu building and updating for the tray dropdown.

use crate::config::Settings;
use crate::models::{BreakKind, DisplayState, Phase, WorkDuration};
use crate::timer::format_time;
use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use std::collections::HashMap;
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_STATS: &str = "stats";
pub const ID_START: &str = "start";
pub const ID_STOP: &str = "stop";
pub const ID_SKIP: &str = "skip";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_NOTIF_TOGGLE: &str = "notif_toggle";
pub const ID_QUIT: &str = "quit";
/// Prefix of the focus duration items, followed by the minutes.
pub const WORK_PREFIX: &str = "work_";

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// Holds references to menu items that need dynamic updates.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub stats: MenuItem,
    pub start: MenuItem,
    pub stop: MenuItem,
    pub skip: MenuItem,
    pub duration_menu: Submenu,
    pub sound_toggle: CheckMenuItem,
    pub notif_toggle: CheckMenuItem,
    pub work_checks: HashMap<WorkDuration, CheckMenuItem>,
}

/// Builds the complete menu structure.
pub fn build_menu(
    state: &DisplayState,
    settings: &Settings,
) -> Result<(Menu, MenuItems), MenuError> {
    let menu = Menu::new();

    // Status display (disabled, info only)
    let status = MenuItem::with_id(
        MenuId::new(ID_STATUS),
        format_status(state),
        false,
        None::<Accelerator>,
    );
    menu.append(&status)?;

    let progress = MenuItem::with_id(
        MenuId::new(ID_PROGRESS),
        format_progress(state),
        false,
        None::<Accelerator>,
    );
    menu.append(&progress)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let stats = MenuItem::with_id(
        MenuId::new(ID_STATS),
        format_stats(state.completed_work_sessions),
        false,
        None::<Accelerator>,
    );
    menu.append(&stats)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let start = MenuItem::with_id(
        MenuId::new(ID_START),
        "▶  Start",
        !state.running,
        None::<Accelerator>,
    );
    let stop = MenuItem::with_id(
        MenuId::new(ID_STOP),
        "⏹  Stop",
        state.running,
        None::<Accelerator>,
    );
    let skip = MenuItem::with_id(
        MenuId::new(ID_SKIP),
        "⏭  Skip",
        state.running,
        None::<Accelerator>,
    );
    menu.append(&start)?;
    menu.append(&stop)?;
    menu.append(&skip)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Focus duration submenu
    let duration_menu = Submenu::new(
        format_duration_label(state.work_duration),
        duration_selectable(state),
    );
    let mut work_checks = HashMap::new();
    for duration in WorkDuration::ALL {
        let item = CheckMenuItem::with_id(
            MenuId::new(format!("{}{}", WORK_PREFIX, duration.minutes())),
            format!("{} min", duration.minutes()),
            true,
            duration == state.work_duration,
            None::<Accelerator>,
        );
        duration_menu.append(&item)?;
        work_checks.insert(duration, item);
    }
    menu.append(&duration_menu)?;

    let sound_toggle = CheckMenuItem::with_id(
        MenuId::new(ID_SOUND_TOGGLE),
        "Sound Enabled",
        true,
        settings.sound_enabled,
        None::<Accelerator>,
    );
    menu.append(&sound_toggle)?;

    let notif_toggle = CheckMenuItem::with_id(
        MenuId::new(ID_NOTIF_TOGGLE),
        "Notifications Enabled",
        true,
        settings.notifications_enabled,
        None::<Accelerator>,
    );
    menu.append(&notif_toggle)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let quit = MenuItem::with_id(
        MenuId::new(ID_QUIT),
        "Quit Cosy Focus",
        true,
        None::<Accelerator>,
    );
    menu.append(&quit)?;

    let items = MenuItems {
        status,
        progress,
        stats,
        start,
        stop,
        skip,
        duration_menu,
        sound_toggle,
        notif_toggle,
        work_checks,
    };

    Ok((menu, items))
}

/// Updates the menu items based on the current state.
pub fn update_menu_items(items: &MenuItems, state: &DisplayState, settings: &Settings) {
    items.status.set_text(format_status(state));
    items.progress.set_text(format_progress(state));
    items.stats.set_text(format_stats(state.completed_work_sessions));

    items.start.set_enabled(!state.running);
    items.stop.set_enabled(state.running);
    items.skip.set_enabled(state.running);

    items
        .duration_menu
        .set_text(format_duration_label(state.work_duration));
    items.duration_menu.set_enabled(duration_selectable(state));
    for (duration, check) in &items.work_checks {
        check.set_checked(*duration == state.work_duration);
    }

    items.sound_toggle.set_checked(settings.sound_enabled);
    items.notif_toggle.set_checked(settings.notifications_enabled);
}

/// The selector only applies while idle in the Work phase.
fn duration_selectable(state: &DisplayState) -> bool {
    !state.running && state.phase == Phase::Work
}

fn format_duration_label(duration: WorkDuration) -> String {
    format!("Focus: {} min", duration.minutes())
}

/// Formats the status line for the menu.
pub fn format_status(state: &DisplayState) -> String {
    let time = format_time(state.remaining_secs);
    match (state.running, state.phase) {
        (false, Phase::Work) => format!("Ready to focus ({})", time),
        (false, Phase::Break) => format!("Break ready ({})", time),
        (true, Phase::Work) => format!("⏱  {} remaining", time),
        (true, Phase::Break) => {
            let kind = match state.break_kind {
                Some(BreakKind::Long) => "Long break",
                _ => "Short break",
            };
            format!("☕  {} - {}", kind, time)
        }
    }
}

/// Formats the progress bar for the menu.
pub fn format_progress(state: &DisplayState) -> String {
    let pct = state.progress.clamp(0.0, 1.0);
    let filled = (pct * 20.0).round() as usize;
    let empty = 20 - filled;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(empty),
        (pct * 100.0).round() as u32
    )
}

/// Formats the session count line for the menu.
pub fn format_stats(completed: u32) -> String {
    match completed {
        0 => "0 sessions completed • Stay hydrated 💧".to_string(),
        1 => "1 session completed • Nice start 🌱".to_string(),
        n => format!("{} sessions completed • Keep it up 🔥", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(running: bool, phase: Phase, remaining_secs: u32, progress: f32) -> DisplayState {
        DisplayState {
            remaining_secs,
            phase,
            break_kind: match phase {
                Phase::Work => None,
                Phase::Break => Some(BreakKind::Short),
            },
            progress,
            running,
            completed_work_sessions: 0,
            work_duration: WorkDuration::TwentyFive,
        }
    }

    #[test]
    fn test_format_status_idle() {
        let s = state(false, Phase::Work, 1500, 0.0);
        assert_eq!(format_status(&s), "Ready to focus (25:00)");
    }

    #[test]
    fn test_format_status_idle_break() {
        let s = state(false, Phase::Break, 300, 0.0);
        assert_eq!(format_status(&s), "Break ready (05:00)");
    }

    #[test]
    fn test_format_status_work_running() {
        let s = state(true, Phase::Work, 1432, 0.05);
        assert_eq!(format_status(&s), "⏱  23:52 remaining");
    }

    #[test]
    fn test_format_status_short_break() {
        let s = state(true, Phase::Break, 180, 0.4);
        assert_eq!(format_status(&s), "☕  Short break - 03:00");
    }

    #[test]
    fn test_format_status_long_break() {
        let mut s = state(true, Phase::Break, 600, 0.33);
        s.break_kind = Some(BreakKind::Long);
        assert_eq!(format_status(&s), "☕  Long break - 10:00");
    }

    #[test]
    fn test_format_progress_idle() {
        let s = state(false, Phase::Work, 1500, 0.0);
        assert_eq!(format_progress(&s), "░░░░░░░░░░░░░░░░░░░░  0%");
    }

    #[test]
    fn test_format_progress_half() {
        let s = state(true, Phase::Work, 750, 0.5);
        assert_eq!(format_progress(&s), "██████████░░░░░░░░░░  50%");
    }

    #[test]
    fn test_format_progress_complete() {
        let s = state(true, Phase::Work, 0, 1.0);
        assert_eq!(format_progress(&s), "████████████████████  100%");
    }

    #[test]
    fn test_format_stats() {
        assert_eq!(format_stats(0), "0 sessions completed • Stay hydrated 💧");
        assert_eq!(format_stats(1), "1 session completed • Nice start 🌱");
        assert_eq!(format_stats(4), "4 sessions completed • Keep it up 🔥");
    }

    #[test]
    fn test_duration_selectable_only_idle_in_work() {
        assert!(duration_selectable(&state(false, Phase::Work, 1500, 0.0)));
        assert!(!duration_selectable(&state(true, Phase::Work, 1500, 0.0)));
        assert!(!duration_selectable(&state(false, Phase::Break, 300, 0.0)));
    }
}
