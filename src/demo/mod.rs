//! Workstation stand-ins for the capability providers.
//!
//! * [`ConsoleRecognizerFactory`]: typed lines play the role of speech.
//! * [`TestCardCamera`]: renders a synthetic frame as JPEG.
//! * [`FixedLocationProvider`]: reports `location.fixed` from the config.
//!
//! The binary wires these into an [`Agent`](crate::agent::Agent) so the
//! whole listen → match → capture → enrich loop runs without hardware.

pub mod camera;
pub mod console;
pub mod location;

pub use camera::TestCardCamera;
pub use console::ConsoleRecognizerFactory;
pub use location::FixedLocationProvider;

use std::sync::Arc;

use crate::agent::Providers;
use crate::config::AppConfig;
use crate::status::LogStatusSink;

/// Demo providers for `config`, reading commands from stdin.
pub fn providers(config: &AppConfig) -> std::io::Result<Providers> {
    Ok(Providers {
        recognizer: Arc::new(ConsoleRecognizerFactory::stdin()?),
        camera: Arc::new(TestCardCamera::default()),
        location: Arc::new(FixedLocationProvider::new(config.location.fixed)),
        status: Arc::new(LogStatusSink),
    })
}
