//! Best-effort location for geotagging.
//!
//! * [`LocationProvider`]: the platform capability (cached fix + one-shot
//!   fresh fix).
//! * [`LocationResolver`]: cache-then-fresh policy under a hard deadline;
//!   always yields `Option<LocationFix>`, never an error.

pub mod resolver;

pub use resolver::LocationResolver;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// LocationFix
// ---------------------------------------------------------------------------

/// A coordinate reported by the location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Horizontal accuracy radius in metres.
    pub accuracy: f32,
    pub obtained_at: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f32) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            obtained_at: Utc::now(),
        }
    }

    /// Age relative to `now`; zero for fixes stamped in the future.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.obtained_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Requested accuracy / power trade-off for a fresh fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixPriority {
    HighAccuracy,
    Balanced,
    LowPower,
}

// ---------------------------------------------------------------------------
// LocationProvider
// ---------------------------------------------------------------------------

/// Platform location capability.
///
/// Both methods return `None` rather than failing when no fix is available
/// (permission denied, provider disabled, no signal).  Dropping a pending
/// `request_single_fix` future cancels the request; implementations must
/// stop location updates when that happens.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// The provider's cached fix, if any.
    async fn last_known_fix(&self) -> Option<LocationFix>;

    /// Acquire one fresh fix, giving up after `timeout`.
    async fn request_single_fix(
        &self,
        priority: FixPriority,
        timeout: Duration,
    ) -> Option<LocationFix>;
}

/// A provider with no location capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn last_known_fix(&self) -> Option<LocationFix> {
        None
    }

    async fn request_single_fix(&self, _: FixPriority, _: Duration) -> Option<LocationFix> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_of_future_fix_is_zero() {
        let mut fix = LocationFix::new(1.0, 2.0, 5.0);
        fix.obtained_at = Utc::now() + chrono::Duration::seconds(30);
        assert_eq!(fix.age_at(Utc::now()), Duration::ZERO);
    }

    #[test]
    fn age_of_past_fix() {
        let mut fix = LocationFix::new(1.0, 2.0, 5.0);
        let now = Utc::now();
        fix.obtained_at = now - chrono::Duration::seconds(90);
        assert_eq!(fix.age_at(now), Duration::from_secs(90));
    }
}
