//! Location provider backed by a coordinate from the config file.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::FixedLocation;
use crate::location::{FixPriority, LocationFix, LocationProvider};

/// Reports the configured coordinate, stamped at the time of the request.
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    fixed: Option<FixedLocation>,
}

impl FixedLocationProvider {
    pub fn new(fixed: Option<FixedLocation>) -> Self {
        Self { fixed }
    }

    fn fix(&self) -> Option<LocationFix> {
        self.fixed
            .as_ref()
            .map(|f| LocationFix::new(f.latitude, f.longitude, f.accuracy))
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn last_known_fix(&self) -> Option<LocationFix> {
        self.fix()
    }

    async fn request_single_fix(&self, _: FixPriority, _: Duration) -> Option<LocationFix> {
        self.fix()
    }
}
