//! Ambient loop and bell cues.
//!
//! [`CueDispatcher`] turns timer events into calls on a [`CuePlayer`]. Audio
//! is an enhancement: player errors are logged here and never reach the
//! timer.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Phase, TimerEvent};

/// Bells are released after this long even if playback has not finished.
pub const BELL_RELEASE_AFTER: Duration = Duration::from_secs(4);

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: rodio::decoder::DecoderError,
    },
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AudioError {
    /// Missing or unreadable media; retrying will not help this session.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Open { .. })
    }
}

/// Playback backend driven by the dispatcher.
pub trait CuePlayer {
    /// Starts the ambient loop, replacing any loop already playing.
    fn start_ambient(&mut self) -> Result<(), AudioError>;
    fn stop_ambient(&mut self);
    /// Plays the bell once, alongside anything else that is playing.
    fn ring_bell(&mut self, now: Instant) -> Result<(), AudioError>;
    /// Drops bells that finished or outlived [`BELL_RELEASE_AFTER`].
    fn release_bells(&mut self, now: Instant);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    pub ambient_path: PathBuf,
    pub bell_path: PathBuf,
    pub ambient_volume: f32,
    pub bell_volume: f32,
}

/// `rodio` implementation. Must stay on the thread that created it.
pub struct RodioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    settings: PlayerSettings,
    ambient: Option<Sink>,
    bells: Vec<(Sink, Instant)>,
}

impl RodioPlayer {
    /// Opens the default output device.
    pub fn new(settings: PlayerSettings) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            settings,
            ambient: None,
            bells: Vec::new(),
        })
    }

    fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, AudioError> {
        let file = File::open(path).map_err(|source| AudioError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Decoder::new(BufReader::new(file)).map_err(|source| AudioError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl CuePlayer for RodioPlayer {
    fn start_ambient(&mut self) -> Result<(), AudioError> {
        self.stop_ambient();
        let source = Self::decode(&self.settings.ambient_path)?.repeat_infinite();
        let sink = Sink::try_new(&self.handle)?;
        sink.set_volume(self.settings.ambient_volume);
        sink.append(source);
        self.ambient = Some(sink);
        Ok(())
    }

    fn stop_ambient(&mut self) {
        if let Some(sink) = self.ambient.take() {
            sink.stop();
        }
    }

    fn ring_bell(&mut self, now: Instant) -> Result<(), AudioError> {
        let source = Self::decode(&self.settings.bell_path)?;
        let sink = Sink::try_new(&self.handle)?;
        sink.set_volume(self.settings.bell_volume);
        sink.append(source);
        self.bells.push((sink, now));
        Ok(())
    }

    fn release_bells(&mut self, now: Instant) {
        self.bells.retain(|(sink, started)| {
            let keep = !sink.empty() && now.duration_since(*started) < BELL_RELEASE_AFTER;
            if !keep {
                sink.stop();
            }
            keep
        });
    }
}

/// Maps timer events onto ambient/bell cues.
pub struct CueDispatcher<P> {
    player: Option<P>,
    ambient_playing: bool,
    ambient_disabled: bool,
    bell_disabled: bool,
    muted: bool,
}

impl<P: CuePlayer> CueDispatcher<P> {
    /// `None` runs silently.
    pub fn new(player: Option<P>) -> Self {
        Self {
            player,
            ambient_playing: false,
            ambient_disabled: false,
            bell_disabled: false,
            muted: false,
        }
    }

    #[cfg(test)]
    pub fn is_ambient_playing(&self) -> bool {
        self.ambient_playing
    }

    #[cfg(test)]
    pub fn player(&self) -> Option<&P> {
        self.player.as_ref()
    }

    /// Reacts to one event. Returns true if a bell was rung.
    pub fn dispatch(&mut self, event: &TimerEvent, now: Instant) -> bool {
        match *event {
            TimerEvent::PhaseStarted {
                phase: Phase::Work, ..
            } => {
                self.start_ambient();
                false
            }
            TimerEvent::PhaseStarted {
                phase: Phase::Break,
                ..
            }
            | TimerEvent::PhaseStopped { .. } => {
                self.stop_ambient();
                false
            }
            TimerEvent::PhaseEnded { phase, .. } => {
                if phase == Phase::Work {
                    self.stop_ambient();
                }
                self.ring_bell(now)
            }
        }
    }

    /// Silences all cues, or lifts the silence. Unmuting does not restart
    /// the ambient loop until the next Work phase starts.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_ambient();
        }
    }

    pub fn release_bells(&mut self, now: Instant) {
        if let Some(player) = self.player.as_mut() {
            player.release_bells(now);
        }
    }

    fn start_ambient(&mut self) {
        if self.muted || self.ambient_disabled {
            return;
        }
        let Some(player) = self.player.as_mut() else {
            return;
        };
        match player.start_ambient() {
            Ok(()) => {
                debug!("ambient loop started");
                self.ambient_playing = true;
            }
            Err(e) => {
                warn!(error = %e, "failed to start ambient loop");
                if e.is_unavailable() {
                    self.ambient_disabled = true;
                }
            }
        }
    }

    fn stop_ambient(&mut self) {
        if !self.ambient_playing {
            return;
        }
        self.ambient_playing = false;
        if let Some(player) = self.player.as_mut() {
            player.stop_ambient();
            debug!("ambient loop stopped");
        }
    }

    fn ring_bell(&mut self, now: Instant) -> bool {
        if self.muted || self.bell_disabled {
            return false;
        }
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        match player.ring_bell(now) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to ring bell");
                if e.is_unavailable() {
                    self.bell_disabled = true;
                }
                false
            }
        }
    }
}
