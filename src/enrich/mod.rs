//! In-place enrichment of captured photos.
//!
//! With a location fix the photo is decoded, the coordinate overlay is
//! burned in, the pixels are re-encoded as JPEG, a GPS EXIF segment is
//! inserted, and the result atomically replaces the original file.  Without
//! a fix the file is not touched.
//!
//! Any failure leaves the captured file exactly as it was: the new bytes are
//! written to a temporary file beside the photo and only renamed over it
//! once complete.

pub mod exif;
pub mod font;
pub mod overlay;

use std::io::Write;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::capture::CaptureResult;
use crate::config::OverlayConfig;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("malformed JPEG: {0}")]
    Malformed(&'static str),

    #[error("could not replace photo: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// What [`ImageEnricher::enrich`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrichment {
    /// No location fix; the file was left as captured.
    Skipped,
    /// Overlay and GPS metadata were written.
    Geotagged,
}

#[derive(Debug, Clone, Default)]
pub struct ImageEnricher {
    config: OverlayConfig,
}

impl ImageEnricher {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    /// Enrich the photo at `result.path`.  Blocking; run it off the async
    /// workers.
    pub fn enrich(&self, result: &CaptureResult) -> Result<Enrichment, EnrichError> {
        let Some(fix) = result.location_fix else {
            return Ok(Enrichment::Skipped);
        };

        let original = std::fs::read(&result.path)?;
        let mut pixels = image::load_from_memory_with_format(&original, ImageFormat::Jpeg)?.to_rgb8();

        let lines = overlay::overlay_lines(&fix, &result.timestamp);
        overlay::draw_overlay(&mut pixels, &lines, &self.config);

        let mut encoded = Vec::with_capacity(original.len());
        let quality = self.config.jpeg_quality.clamp(1, 100);
        JpegEncoder::new_with_quality(&mut encoded, quality).encode_image(&pixels)?;

        let tagged = exif::insert_gps_segment(&encoded, &exif::gps_segment(&fix))?;
        replace_file(&result.path, &tagged)?;

        log::debug!(
            "enrich: wrote {} bytes to {} ({} {})",
            tagged.len(),
            result.path.display(),
            exif::latitude_ref(fix.latitude),
            exif::longitude_ref(fix.longitude)
        );
        Ok(Enrichment::Geotagged)
    }
}

/// Atomically replace `path` with `bytes`.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), EnrichError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
