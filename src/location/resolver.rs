//! Cache-then-fresh location resolution under a deadline.
//!
//! ```text
//! resolve(timeout)
//!   ├─ last_known_fix()            → fresh enough? ─ yes ─▶ Some(fix)
//!   └─ request_single_fix(High)    → first update  ──────▶ Some(fix)
//!   deadline elapsed / nothing     ──────────────────────▶ None
//! ```
//!
//! The fresh request asks for exactly one fix; when the deadline elapses
//! the request future is dropped, which cancels it on the provider side.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::LocationConfig;

use super::{FixPriority, LocationFix, LocationProvider};

pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
    fresh_fix_timeout: Duration,
    max_fix_age: Duration,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>, config: &LocationConfig) -> Self {
        Self {
            provider,
            fresh_fix_timeout: Duration::from_millis(config.fresh_fix_timeout_ms),
            max_fix_age: Duration::from_secs(config.max_fix_age_secs),
        }
    }

    /// Best available fix within `timeout`, or `None`.
    pub async fn resolve(&self, timeout: Duration) -> Option<LocationFix> {
        match tokio::time::timeout(timeout, self.resolve_unbounded()).await {
            Ok(fix) => fix,
            Err(_) => {
                log::warn!(
                    "location: no fix within {} ms, continuing without",
                    timeout.as_millis()
                );
                None
            }
        }
    }

    async fn resolve_unbounded(&self) -> Option<LocationFix> {
        if let Some(fix) = self.provider.last_known_fix().await {
            let age = fix.age_at(Utc::now());
            if age <= self.max_fix_age {
                log::debug!("location: using cached fix ({} s old)", age.as_secs());
                return Some(fix);
            }
            log::debug!("location: cached fix is {} s old, requesting a fresh one", age.as_secs());
        }

        let fix = self
            .provider
            .request_single_fix(FixPriority::HighAccuracy, self.fresh_fix_timeout)
            .await;
        if fix.is_none() {
            log::info!("location: provider has no fix");
        }
        fix
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
