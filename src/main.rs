//! Cosy Focus - a menubar Pomodoro timer.
//!
//! Cycles focus and break phases, plays an ambient loop while you work,
//! rings a bell at every phase change and draws the progress ring over a
//! blurred background as the tray icon.

use std::time::Instant;

use muda::MenuEvent;
use tracing::{error, info, warn};
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod app;
mod audio;
mod background;
mod clock;
mod config;
mod event;
mod menu;
mod models;
mod notifications;
mod ring;
mod scheduler;
mod telemetry;
mod timer;
mod tray;

use app::App;
use audio::{CueDispatcher, RodioPlayer};
use background::BackgroundCache;
use clock::SystemClock;
use config::Settings;
use event::EventResult;
use menu::MenuItems;
use models::{Phase, TimerEvent};

/// Events delivered to the loop from other threads.
#[derive(Debug)]
enum UserEvent {
    Menu(MenuEvent),
}

/// Application handler for the winit event loop.
struct CosyFocus {
    app: App<SystemClock, RodioPlayer>,
    settings: Settings,
    tray: TrayIcon,
    menu_items: MenuItems,
    background: BackgroundCache,
    /// Phase and whole-degree sweep of the icon currently shown.
    drawn_ring: Option<(Phase, u16)>,
    drawn_title: String,
}

impl CosyFocus {
    fn refresh(&mut self, force: bool) {
        let state = self.app.display_state();

        let title = timer::format_tray_title(&state);
        if force || title != self.drawn_title {
            self.tray.set_title(Some(&title));
            menu::update_menu_items(&self.menu_items, &state, &self.settings);
            self.drawn_title = title;
        }

        let ring = ring::render(state.progress, state.phase);
        let key = (state.phase, ring.sweep_deg.round() as u16);
        if force || self.drawn_ring != Some(key) {
            let image = tray::rasterize(&ring, self.settings.icon_size, self.background.image());
            match tray::ring_icon(image) {
                Ok(icon) => {
                    if let Err(e) = self.tray.set_icon(Some(icon)) {
                        warn!(error = %e, "failed to update tray icon");
                    }
                }
                Err(e) => warn!(error = %e, "failed to build tray icon"),
            }
            self.drawn_ring = Some(key);
        }
    }

    fn announce(&self, events: &[TimerEvent]) {
        for event in events {
            if let TimerEvent::PhaseEnded {
                phase: Phase::Work,
                completed_work_sessions,
            } = event
            {
                info!(completed = *completed_work_sessions, "work session completed");
            }
            if self.settings.notifications_enabled {
                notifications::notify_transition(event);
            }
        }
    }

    fn handle_menu_event(&mut self, event_loop: &ActiveEventLoop, event: MenuEvent) {
        let result = match event::parse_command(event.id().as_ref()) {
            Some(command) => event::handle_command(&mut self.app, &mut self.settings, command),
            None => EventResult::Continue,
        };

        match result {
            EventResult::Quit => event_loop.exit(),
            EventResult::StateChanged => self.refresh(true),
            EventResult::Continue => {}
        }
    }
}

impl ApplicationHandler<UserEvent> for CosyFocus {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Menu(event) => self.handle_menu_event(event_loop, event),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let events = self.app.run_due();
        if self.background.poll(Instant::now()) {
            self.drawn_ring = None;
        }
        self.announce(&events);
        self.refresh(!events.is_empty());

        // Sleep until the next tick or background render is due.
        let deadline = [self.app.next_deadline(), self.background.next_deadline()]
            .into_iter()
            .flatten()
            .min();
        event_loop.set_control_flow(match deadline {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    telemetry::init_tracing(&settings.log_level);

    // Audio is created on the main thread; rodio's stream is not Send
    let player = match RodioPlayer::new(settings.player_settings()) {
        Ok(player) => Some(player),
        Err(e) if settings.require_audio => {
            error!(error = %e, "audio output unavailable");
            notifications::notify_audio_unavailable(&e.to_string());
            return Err(e.into());
        }
        Err(e) => {
            warn!(error = %e, "audio output unavailable, running silently");
            None
        }
    };
    let mut cues = CueDispatcher::new(player);
    cues.set_muted(!settings.sound_enabled);
    let app = App::new(SystemClock, settings.work_duration(), cues);

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;

    // Forward menu clicks into the loop so all state stays on this thread
    let proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event| {
        let _ = proxy.send_event(UserEvent::Menu(event));
    }));

    let state = app.display_state();
    let (built_menu, menu_items) = menu::build_menu(&state, &settings)?;

    let mut background = BackgroundCache::open(&settings.background_path);
    background.request((settings.icon_size, settings.icon_size), Instant::now());

    let icon = tray::ring_icon(tray::rasterize(
        &ring::render(state.progress, state.phase),
        settings.icon_size,
        background.image(),
    ))?;
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_icon(icon)
        .with_title("🍅")
        .with_tooltip("Cosy Focus - Pomodoro Timer")
        .build()?;

    info!(minutes = state.work_duration.minutes(), "cosy focus ready");

    let mut handler = CosyFocus {
        app,
        settings,
        tray,
        menu_items,
        background,
        drawn_ring: None,
        drawn_title: String::new(),
    };

    event_loop.run_app(&mut handler)?;

    Ok(())
}
