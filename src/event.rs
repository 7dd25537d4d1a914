//! Menu event handling.

use tracing::debug;

use crate::app::App;
use crate::audio::CuePlayer;
use crate::clock::Clock;
use crate::config::Settings;
use crate::menu::{
    ID_NOTIF_TOGGLE, ID_QUIT, ID_SKIP, ID_SOUND_TOGGLE, ID_START, ID_STOP, WORK_PREFIX,
};
use crate::models::WorkDuration;

/// What a menu click asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Skip,
    SetWorkDuration(WorkDuration),
    ToggleSound,
    ToggleNotifications,
    Quit,
}

/// Result of handling a menu event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event handled, nothing to redraw.
    Continue,
    /// User requested quit.
    Quit,
    /// State changed, menu and tray need update.
    StateChanged,
}

/// Maps a menu item id to a command.
pub fn parse_command(id: &str) -> Option<Command> {
    match id {
        ID_START => Some(Command::Start),
        ID_STOP => Some(Command::Stop),
        ID_SKIP => Some(Command::Skip),
        ID_SOUND_TOGGLE => Some(Command::ToggleSound),
        ID_NOTIF_TOGGLE => Some(Command::ToggleNotifications),
        ID_QUIT => Some(Command::Quit),
        _ => id
            .strip_prefix(WORK_PREFIX)
            .and_then(|mins| mins.parse::<u32>().ok())
            .and_then(WorkDuration::from_minutes)
            .map(Command::SetWorkDuration),
    }
}

/// Applies a command to the app and the in-memory settings.
pub fn handle_command<C: Clock, P: CuePlayer>(
    app: &mut App<C, P>,
    settings: &mut Settings,
    command: Command,
) -> EventResult {
    match command {
        Command::Start => {
            app.start();
            EventResult::StateChanged
        }
        Command::Stop => {
            app.stop();
            EventResult::StateChanged
        }
        Command::Skip => {
            app.skip();
            EventResult::StateChanged
        }
        Command::SetWorkDuration(duration) => {
            if !app.set_work_duration(duration) {
                debug!(
                    minutes = duration.minutes(),
                    "duration change ignored while running or on break"
                );
            }
            // Either way the checkmarks must mirror the timer again.
            EventResult::StateChanged
        }
        Command::ToggleSound => {
            settings.sound_enabled = !settings.sound_enabled;
            app.set_muted(!settings.sound_enabled);
            EventResult::StateChanged
        }
        Command::ToggleNotifications => {
            settings.notifications_enabled = !settings.notifications_enabled;
            EventResult::StateChanged
        }
        Command::Quit => EventResult::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::RecordingPlayer;
    use crate::audio::CueDispatcher;
    use crate::clock::ManualClock;

    fn create_test_app() -> App<ManualClock, RecordingPlayer> {
        App::new(
            ManualClock::new(),
            WorkDuration::default(),
            CueDispatcher::new(Some(RecordingPlayer::default())),
        )
    }

    #[test]
    fn test_parse_control_commands() {
        assert_eq!(parse_command("start"), Some(Command::Start));
        assert_eq!(parse_command("stop"), Some(Command::Stop));
        assert_eq!(parse_command("skip"), Some(Command::Skip));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("sound_toggle"), Some(Command::ToggleSound));
        assert_eq!(
            parse_command("notif_toggle"),
            Some(Command::ToggleNotifications)
        );
    }

    #[test]
    fn test_parse_work_duration() {
        assert_eq!(
            parse_command("work_30"),
            Some(Command::SetWorkDuration(WorkDuration::Thirty))
        );
        assert_eq!(parse_command("work_40"), None);
        assert_eq!(parse_command("work_abc"), None);
    }

    #[test]
    fn test_info_items_are_not_commands() {
        assert_eq!(parse_command("status"), None);
        assert_eq!(parse_command("progress"), None);
        assert_eq!(parse_command("stats"), None);
    }

    #[test]
    fn test_start_and_stop_commands() {
        let mut app = create_test_app();
        let mut settings = Settings::default();

        assert_eq!(
            handle_command(&mut app, &mut settings, Command::Start),
            EventResult::StateChanged
        );
        assert!(app.display_state().running);

        handle_command(&mut app, &mut settings, Command::Stop);
        assert!(!app.display_state().running);
    }

    #[test]
    fn test_duration_command_while_running_keeps_timer_duration() {
        let mut app = create_test_app();
        let mut settings = Settings::default();
        handle_command(&mut app, &mut settings, Command::Start);

        let result = handle_command(
            &mut app,
            &mut settings,
            Command::SetWorkDuration(WorkDuration::ThirtyFive),
        );
        assert_eq!(result, EventResult::StateChanged);
        assert_eq!(app.display_state().work_duration, WorkDuration::TwentyFive);
    }

    #[test]
    fn test_toggles_flip_settings() {
        let mut app = create_test_app();
        let mut settings = Settings::default();

        handle_command(&mut app, &mut settings, Command::ToggleSound);
        handle_command(&mut app, &mut settings, Command::ToggleNotifications);
        assert!(!settings.sound_enabled);
        assert!(!settings.notifications_enabled);

        // Muted: starting work does not reach the player.
        handle_command(&mut app, &mut settings, Command::Start);
        assert!(!app.cues().is_ambient_playing());
    }

    #[test]
    fn test_quit() {
        let mut app = create_test_app();
        let mut settings = Settings::default();
        assert_eq!(
            handle_command(&mut app, &mut settings, Command::Quit),
            EventResult::Quit
        );
    }
}
