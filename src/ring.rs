//! Progress ring geometry and colors.
//!
//! Pure mapping from `(progress, phase)` to a [`RingDescription`]. Angles are
//! measured in degrees clockwise from the 12 o'clock position.

use image::Rgba;

use crate::models::Phase;

/// Neutral track behind the progress arc.
pub const TRACK_COLOR: Rgba<u8> = Rgba([0xE6, 0xEA, 0xF2, 0xFF]);
/// Arc color during focus.
pub const WORK_COLOR: Rgba<u8> = Rgba([0x2D, 0xB4, 0x7C, 0xFF]);
/// Arc color during breaks.
pub const BREAK_COLOR: Rgba<u8> = Rgba([0x5B, 0x8D, 0xEF, 0xFF]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingDescription {
    pub background_color: Rgba<u8>,
    pub foreground_color: Rgba<u8>,
    pub start_angle_deg: f32,
    pub sweep_deg: f32,
    /// Terminal point of the sweep on the unit circle, in screen
    /// coordinates (y grows downward).
    pub marker: (f32, f32),
}

impl RingDescription {
    /// Whether a clockwise angle from 12 o'clock falls inside the sweep.
    pub fn contains_angle(&self, angle_deg: f32) -> bool {
        let angle = angle_deg.rem_euclid(360.0);
        angle - self.start_angle_deg <= self.sweep_deg && self.sweep_deg > 0.0
    }
}

pub fn render(progress: f32, phase: Phase) -> RingDescription {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let sweep_deg = progress * 360.0;
    let theta = sweep_deg.to_radians();

    RingDescription {
        background_color: TRACK_COLOR,
        foreground_color: phase_color(phase),
        start_angle_deg: 0.0,
        sweep_deg,
        marker: (theta.sin(), -theta.cos()),
    }
}

pub fn phase_color(phase: Phase) -> Rgba<u8> {
    match phase {
        Phase::Work => WORK_COLOR,
        Phase::Break => BREAK_COLOR,
    }
}
