//! One-in-flight capture pipeline.
//!
//! ```text
//! try_begin(req)        NotReady / Busy ─▶ status + Err
//!      │ CaptureTicket (in-flight flag held)
//!      ▼
//! capture_with(ticket, req)
//!      ├─ LocationResolver::resolve(timeout)        → Option<LocationFix>
//!      ├─ CaptureProvider::capture(dest, fix)       → "Capturing..."
//!      ├─ spawn_blocking(ImageEnricher::enrich)     (failure logged only)
//!      ├─ "Photo saved: …" | "Error taking photo"
//!      └─ reset_zoom_after? → set_zoom(0.0)
//!      ▼
//! ticket dropped → in-flight flag cleared
//! ```
//!
//! The in-flight flag is claimed with a single compare-exchange, so two
//! concurrent `try_begin` calls can never both succeed.  It is released by
//! dropping the [`CaptureTicket`], which happens on every path out of
//! `capture_with`, panics included.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, CaptureConfig};
use crate::enrich::{Enrichment, ImageEnricher};
use crate::location::LocationResolver;
use crate::recognition::{RestartCause, RetryPolicy};
use crate::status::{StatusEvent, StatusSink};

use super::naming::{numbered_file_name, photo_file_name};
use super::{CaptureError, CaptureProvider, CaptureRequest, CaptureResult};

// ---------------------------------------------------------------------------
// CaptureTicket
// ---------------------------------------------------------------------------

/// Proof that the caller owns the single in-flight capture slot.
///
/// Dropping the ticket frees the slot.
#[derive(Debug)]
pub struct CaptureTicket {
    in_flight: Arc<AtomicBool>,
}

impl Drop for CaptureTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// CapturePipeline
// ---------------------------------------------------------------------------

pub struct CapturePipeline {
    camera: Arc<dyn CaptureProvider>,
    resolver: LocationResolver,
    enricher: ImageEnricher,
    status: Arc<dyn StatusSink>,
    output_dir: PathBuf,
    file_prefix: String,
    location_timeout: Duration,
    ready: AtomicBool,
    in_flight: Arc<AtomicBool>,
}

impl CapturePipeline {
    pub fn new(
        camera: Arc<dyn CaptureProvider>,
        resolver: LocationResolver,
        enricher: ImageEnricher,
        status: Arc<dyn StatusSink>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            camera,
            resolver,
            enricher,
            status,
            output_dir: config.resolved_output_dir(),
            file_prefix: config.file_prefix.clone(),
            location_timeout: config.location_timeout(),
            ready: AtomicBool::new(false),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a pipeline from the full application config.
    pub fn from_config(
        camera: Arc<dyn CaptureProvider>,
        location: Arc<dyn crate::location::LocationProvider>,
        status: Arc<dyn StatusSink>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            camera,
            LocationResolver::new(location, &config.location),
            ImageEnricher::new(config.overlay.clone()),
            status,
            &config.capture,
        )
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Initialisation
    // -----------------------------------------------------------------------

    /// Initialise the camera, retrying with the init-failure delay.
    ///
    /// Returns `true` once the camera is ready, `false` if `cancel` fired
    /// first.
    pub async fn initialize(&self, policy: &RetryPolicy, cancel: &CancellationToken) -> bool {
        let delay = policy.delay_for(RestartCause::InitFailure);
        let mut attempt = 1u32;

        loop {
            if cancel.is_cancelled() {
                return false;
            }

            match self.camera.initialize().await {
                Ok(()) => {
                    self.ready.store(true, Ordering::Release);
                    log::info!("capture: camera ready after {attempt} attempt(s)");
                    StatusEvent::CameraReady.publish_to(self.status.as_ref());
                    return true;
                }
                Err(e) => {
                    log::warn!(
                        "capture: {e} (attempt {attempt}); retrying in {} ms",
                        delay.as_millis()
                    );
                }
            }

            tokio::select! {
                () = cancel.cancelled() => return false,
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    // -----------------------------------------------------------------------
    // Capture
    // -----------------------------------------------------------------------

    /// Claim the in-flight slot for `req`.
    ///
    /// Rejections publish their status here, so every refused command is
    /// visible to the user.
    pub fn try_begin(&self, req: &CaptureRequest) -> Result<CaptureTicket, CaptureError> {
        if !self.is_ready() {
            log::warn!("capture: rejected, camera not ready");
            let event = if req.zoom_level.is_some() {
                StatusEvent::CameraNotReadyForZoom
            } else {
                StatusEvent::CameraNotReady
            };
            event.publish_to(self.status.as_ref());
            return Err(CaptureError::NotReady);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("capture: rejected, another capture is in flight");
            StatusEvent::CaptureBusy.publish_to(self.status.as_ref());
            return Err(CaptureError::Busy);
        }

        Ok(CaptureTicket {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Claim the slot and run `req` to completion.
    pub async fn capture(&self, req: CaptureRequest) -> Result<CaptureResult, CaptureError> {
        let ticket = self.try_begin(&req)?;
        self.capture_with(ticket, req).await
    }

    /// Run `req` while holding `ticket`.  The slot is released on return.
    pub async fn capture_with(
        &self,
        ticket: CaptureTicket,
        req: CaptureRequest,
    ) -> Result<CaptureResult, CaptureError> {
        let outcome = self.shoot(&req).await;

        if req.reset_zoom_after {
            self.reset_zoom().await;
        }

        drop(ticket);
        outcome
    }

    async fn shoot(&self, req: &CaptureRequest) -> Result<CaptureResult, CaptureError> {
        StatusEvent::Capturing.publish_to(self.status.as_ref());

        let fix = self.resolver.resolve(self.location_timeout).await;
        let timestamp = Local::now();
        let file_name = photo_file_name(&self.file_prefix, &timestamp, fix.as_ref());

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            log::error!("capture: cannot create {}: {e}", self.output_dir.display());
            StatusEvent::CaptureFailed.publish_to(self.status.as_ref());
            return Err(CaptureError::Failed(e.to_string()));
        }
        let destination = self.free_destination(&file_name).await;

        log::info!(
            "capture: shooting {} (zoom {:?}, {})",
            destination.display(),
            req.zoom_level,
            if fix.is_some() { "with location" } else { "no location" }
        );

        let path = match self.camera.capture(&destination, fix).await {
            Ok(path) => path,
            Err(e) => {
                log::error!("capture: {e}");
                StatusEvent::CaptureFailed.publish_to(self.status.as_ref());
                return Err(e);
            }
        };

        let result = CaptureResult {
            path,
            location_fix: fix,
            timestamp,
        };

        self.enrich(result.clone()).await;

        log::info!("capture: saved {}", result.path.display());
        StatusEvent::PhotoSaved {
            file_name: result.file_name(),
        }
        .publish_to(self.status.as_ref());

        Ok(result)
    }

    /// First path in the output directory not already taken by `file_name`
    /// or one of its `_1`, `_2`, ... variants.  Names only resolve to the
    /// second, so back-to-back shots would otherwise overwrite each other.
    /// The in-flight ticket keeps this check and the write from racing.
    async fn free_destination(&self, file_name: &str) -> PathBuf {
        let mut destination = self.output_dir.join(file_name);
        let mut n = 0;
        while tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            n += 1;
            destination = self.output_dir.join(numbered_file_name(file_name, n));
        }
        destination
    }

    /// Enrich off the async workers.  Failures leave the photo as captured.
    async fn enrich(&self, result: CaptureResult) {
        let enricher = self.enricher.clone();
        let path = result.path.clone();

        match tokio::task::spawn_blocking(move || enricher.enrich(&result)).await {
            Ok(Ok(Enrichment::Geotagged)) => {
                log::debug!("enrich: geotagged {}", path.display());
            }
            Ok(Ok(Enrichment::Skipped)) => {
                log::debug!("enrich: no location for {}, left as captured", path.display());
            }
            Ok(Err(e)) => {
                log::warn!("enrich: {} left unenriched: {e}", path.display());
            }
            Err(e) => {
                log::error!("enrich: task failed for {}: {e}", path.display());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Zoom
    // -----------------------------------------------------------------------

    /// Apply a zoom directive, reporting the outcome as status.
    pub async fn set_zoom(&self, level: f32) -> Result<(), CaptureError> {
        if !self.is_ready() {
            StatusEvent::CameraNotReadyForZoom.publish_to(self.status.as_ref());
            return Err(CaptureError::NotReady);
        }

        match self.camera.set_zoom(level).await {
            Ok(()) => {
                log::debug!("capture: zoom set to {level}");
                StatusEvent::ZoomSet {
                    percent: level * 100.0,
                }
                .publish_to(self.status.as_ref());
                Ok(())
            }
            Err(e) => {
                log::warn!("capture: {e}");
                StatusEvent::ZoomFailed.publish_to(self.status.as_ref());
                Err(e)
            }
        }
    }

    async fn reset_zoom(&self) {
        match self.camera.set_zoom(0.0).await {
            Ok(()) => log::debug!("capture: zoom reset"),
            Err(e) => log::warn!("capture: zoom reset failed: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
