//! Scheduled sweep task

use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::sync::engine::SyncEngine;

/// Spawn the periodic all-pairs sweep. Returns `None` when sweeping is
/// disabled in configuration.
pub fn start_sweep_task(engine: SyncEngine, config: &SyncConfig) -> Option<JoinHandle<()>> {
    if !config.enabled {
        tracing::info!("scheduled playlist sweep disabled");
        return None;
    }

    let period = Duration::from_secs(config.interval_seconds);
    tracing::info!(interval_seconds = config.interval_seconds, "scheduled playlist sweep enabled");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately; skip it so startup stays quick.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            engine.sweep().await;
        }
    }))
}
