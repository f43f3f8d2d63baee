//! Synthetic camera that renders a test card.
//!
//! The frame is a colour gradient with a centred crosshair.  Zoom narrows
//! the sampled window around the centre (up to 4×), so zoomed shots are
//! visibly different from wide ones.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};

use crate::capture::{CaptureError, CaptureProvider};
use crate::location::LocationFix;

const MAX_MAGNIFICATION: f32 = 4.0;

pub struct TestCardCamera {
    width: u32,
    height: u32,
    /// `f32` zoom level stored as bits.
    zoom: AtomicU32,
}

impl TestCardCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(16),
            height: height.max(16),
            zoom: AtomicU32::new(0f32.to_bits()),
        }
    }

    pub fn zoom(&self) -> f32 {
        f32::from_bits(self.zoom.load(Ordering::Relaxed))
    }
}

impl Default for TestCardCamera {
    fn default() -> Self {
        Self::new(1280, 960)
    }
}

/// Render one frame at linear `zoom` (0.0–1.0).
pub fn render(width: u32, height: u32, zoom: f32) -> RgbImage {
    let magnification = 1.0 + zoom.clamp(0.0, 1.0) * (MAX_MAGNIFICATION - 1.0);
    let (cx, cy) = (width / 2, height / 2);

    RgbImage::from_fn(width, height, |x, y| {
        if x == cx || y == cy {
            return Rgb([255, 255, 255]);
        }
        let u = 0.5 + (x as f32 / width as f32 - 0.5) / magnification;
        let v = 0.5 + (y as f32 / height as f32 - 0.5) / magnification;
        Rgb([(u * 255.0) as u8, (v * 255.0) as u8, 96])
    })
}

#[async_trait]
impl CaptureProvider for TestCardCamera {
    async fn initialize(&self) -> Result<(), CaptureError> {
        log::info!("camera: test card {}x{}", self.width, self.height);
        Ok(())
    }

    async fn capture(
        &self,
        destination: &Path,
        _location: Option<LocationFix>,
    ) -> Result<PathBuf, CaptureError> {
        let (width, height, zoom) = (self.width, self.height, self.zoom());
        let path = destination.to_path_buf();

        let written = tokio::task::spawn_blocking(move || {
            let frame = render(width, height, zoom);
            match frame.save_with_format(&path, ImageFormat::Jpeg) {
                Ok(()) => Ok(path),
                Err(e) => {
                    let _ = std::fs::remove_file(&path);
                    Err(CaptureError::Failed(e.to_string()))
                }
            }
        })
        .await;

        match written {
            Ok(result) => result,
            Err(e) => Err(CaptureError::Failed(e.to_string())),
        }
    }

    async fn set_zoom(&self, level: f32) -> Result<(), CaptureError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(CaptureError::Zoom(format!("level {level} out of range")));
        }
        self.zoom.store(level.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}
