//! Application entry point: voice-triggered capture with demo providers.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG`, default `info`).
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the demo providers (stdin recogniser, test-card camera, fixed
//!    location) and the [`Agent`].
//! 5. Run until Ctrl-C, then wait for any in-flight capture to finish.
//!
//! Type a command such as `take a photo` or `zoom in` and press Enter while
//! the agent is listening.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use voice_capture::{agent::Agent, config::AppConfig, demo};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-capture starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    log::info!(
        "photos go to {}",
        config.capture.resolved_output_dir().display()
    );

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async move {
        // 4. Providers and agent
        let providers = demo::providers(&config).context("failed to start console input")?;
        let agent = Agent::new(&config, providers);

        let mut state = agent.subscribe();
        tokio::spawn(async move {
            while state.changed().await.is_ok() {
                let current = *state.borrow_and_update();
                log::debug!("recognition: {}", current.label());
            }
        });

        // 5. Ctrl-C → cancel → drain
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log::info!("Ctrl-C received, shutting down");
                    stopper.cancel();
                }
                Err(e) => log::error!("cannot listen for Ctrl-C: {e}"),
            }
        });

        log::info!("say (type) \"take a photo\" or \"zoom in\"; Ctrl-C to quit");
        agent.run(cancel).await;
        Ok::<(), anyhow::Error>(())
    })?;

    log::info!("voice-capture exited cleanly");
    Ok(())
}
