//! Tray icon drawing.
//!
//! The icon is the progress ring painted over the blurred background, built
//! pixel by pixel from a [`RingDescription`].

use image::{Rgba, RgbaImage};
use thiserror::Error;
use tray_icon::Icon;

use crate::ring::RingDescription;

/// Ring band thickness relative to the icon edge (14px on a 260px canvas).
const BAND_RATIO: f32 = 14.0 / 260.0;
/// Padding between the ring and the icon edge.
const PAD_RATIO: f32 = 16.0 / 260.0;

#[derive(Error, Debug)]
pub enum TrayError {
    #[error("Failed to load icon: {0}")]
    IconLoad(#[from] tray_icon::BadIcon),
}

/// Paints the ring onto a `size`x`size` canvas. `backdrop` must have the
/// same dimensions to be used; otherwise the canvas is transparent.
pub fn rasterize(ring: &RingDescription, size: u32, backdrop: Option<&RgbaImage>) -> RgbaImage {
    let size = size.max(1);
    let mut canvas = match backdrop {
        Some(image) if image.dimensions() == (size, size) => image.clone(),
        _ => RgbaImage::new(size, size),
    };

    let edge = size as f32;
    let band = (edge * BAND_RATIO).max(2.0);
    let pad = (edge * PAD_RATIO).max(1.0);
    let center = edge / 2.0;
    // Radius of the band's center line.
    let radius = center - pad - band / 2.0;
    let marker_radius = band * 0.7;
    let marker = (
        center + radius * ring.marker.0,
        center + radius * ring.marker.1,
    );

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let dx = px - center;
        let dy = py - center;

        let from_band = ((dx * dx + dy * dy).sqrt() - radius).abs();
        let band_cover = coverage(band / 2.0 - from_band);
        if band_cover > 0.0 {
            let angle = dx.atan2(-dy).to_degrees();
            let color = if ring.contains_angle(angle) {
                ring.foreground_color
            } else {
                ring.background_color
            };
            blend(pixel, color, band_cover);
        }

        let mx = px - marker.0;
        let my = py - marker.1;
        let marker_cover = coverage(marker_radius - (mx * mx + my * my).sqrt());
        if marker_cover > 0.0 {
            blend(pixel, ring.foreground_color, marker_cover);
        }
    }

    canvas
}

/// Builds a tray icon from a rasterized ring.
pub fn ring_icon(image: RgbaImage) -> Result<Icon, TrayError> {
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height).map_err(TrayError::IconLoad)
}

/// One-pixel anti-aliasing ramp.
fn coverage(distance_inside: f32) -> f32 {
    (distance_inside + 0.5).clamp(0.0, 1.0)
}

fn blend(pixel: &mut Rgba<u8>, color: Rgba<u8>, cover: f32) {
    let alpha = cover * f32::from(color.0[3]) / 255.0;
    for i in 0..3 {
        let under = f32::from(pixel.0[i]);
        let over = f32::from(color.0[i]);
        pixel.0[i] = (over * alpha + under * (1.0 - alpha)).round() as u8;
    }
    let under_alpha = f32::from(pixel.0[3]) / 255.0;
    pixel.0[3] = ((alpha + under_alpha * (1.0 - alpha)) * 255.0).round() as u8;
}
