//! Blurred background behind the progress ring.
//!
//! Re-rendering a large image is expensive, so size changes are debounced:
//! a cheap preview is produced immediately and the sharp render runs once
//! requests have settled for [`BACKGROUND_DEBOUNCE`].

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::scheduler::{Scheduler, TimerHandle};

pub const BACKGROUND_DEBOUNCE: Duration = Duration::from_millis(120);

const BLUR_SIGMA: f32 = 1.3;
/// Alpha of the black veil drawn over the image.
const OVERLAY_ALPHA: u8 = 60;

#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("Failed to load background image: {0}")]
    Load(#[from] image::ImageError),
}

/// Loads and pre-blurs the source image.
pub fn load(path: &Path) -> Result<DynamicImage, BackgroundError> {
    let image = image::open(path)?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()).blur(BLUR_SIGMA))
}

/// Crops `source` to fill `size` and darkens it. A non-sharp render
/// downsamples to half size first, trading quality for speed.
pub fn render(source: &DynamicImage, (width, height): (u32, u32), sharp: bool) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);

    let fitted = if sharp {
        source.resize_to_fill(width, height, FilterType::Lanczos3)
    } else {
        source
            .resize_to_fill((width / 2).max(1), (height / 2).max(1), FilterType::Triangle)
            .resize_exact(width, height, FilterType::Triangle)
    };

    let mut rgba = fitted.to_rgba8();
    let keep = u16::from(255 - OVERLAY_ALPHA);
    for pixel in rgba.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (u16::from(*channel) * keep / 255) as u8;
        }
    }
    rgba
}

/// Holds the current background and debounces sharp re-renders.
pub struct BackgroundCache {
    source: Option<DynamicImage>,
    current: Option<RgbaImage>,
    size: (u32, u32),
    scheduler: Scheduler<(u32, u32)>,
    pending: Option<TimerHandle>,
    sharp_renders: usize,
}

impl BackgroundCache {
    /// `None` means no background; every request is then a no-op.
    pub fn new(source: Option<DynamicImage>) -> Self {
        Self {
            source,
            current: None,
            size: (0, 0),
            scheduler: Scheduler::new(),
            pending: None,
            sharp_renders: 0,
        }
    }

    /// Loads `path`, falling back to no background if it cannot be read.
    pub fn open(path: &Path) -> Self {
        match load(path) {
            Ok(source) => {
                info!(path = %path.display(), "background loaded");
                Self::new(Some(source))
            }
            Err(e) => {
                info!(path = %path.display(), error = %e, "running without background");
                Self::new(None)
            }
        }
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.current.as_ref()
    }

    /// Shows a quick preview at `size` and (re)schedules the sharp render.
    pub fn request(&mut self, size: (u32, u32), now: Instant) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
        self.current = Some(render(source, size, false));
        self.size = size;
        self.pending = Some(self.scheduler.schedule(now, BACKGROUND_DEBOUNCE, size));
    }

    /// Performs the sharp render if it is due. Returns true if the image
    /// changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(size) = self.scheduler.take_due(now).pop() else {
            return false;
        };
        self.pending = None;
        let Some(source) = self.source.as_ref() else {
            return false;
        };
        self.current = Some(render(source, size, true));
        self.sharp_renders += 1;
        debug!(
            width = size.0,
            height = size.1,
            renders = self.sharp_renders,
            "background sharpened"
        );
        true
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    #[cfg(test)]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    #[cfg(test)]
    fn sharp_renders(&self) -> usize {
        self.sharp_renders
    }
}
