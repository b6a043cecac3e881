// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use placeshot_sync::config::Config;
use placeshot_sync::connectivity::{ConnectivityMonitor, HttpProbeSource};
use placeshot_sync::logging::setup_logging;
use placeshot_sync::remote::{
    BackendListingService, HttpUploadPipeline, RemoteListing, UploadPipeline,
};
use placeshot_sync::store::{LocalStore, SqliteStore};
use placeshot_sync::sync::SyncOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    setup_logging(&config.log_level)?;

    info!("Starting placeshot-sync v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn LocalStore> = Arc::new(SqliteStore::new(&config.cache_db_path).await?);
    info!("Local store initialized at {}", config.cache_db_path.display());

    let listing: Arc<dyn RemoteListing> = Arc::new(BackendListingService::new(
        config.backend_api_url.clone(),
        config.backend_api_key.clone(),
        config.request_timeout(),
    )?);
    let pipeline: Arc<dyn UploadPipeline> = Arc::new(HttpUploadPipeline::new(
        config.backend_api_url.clone(),
        config.backend_api_key.clone(),
        config.request_timeout(),
    )?);

    let orchestrator = Arc::new(SyncOrchestrator::new(store, listing, pipeline));

    // Headless deployments have no platform network callback; probe the
    // backend health endpoint as the reachability primitive instead.
    let probe_url = format!(
        "{}/health",
        config.backend_api_url.trim_end_matches('/')
    );
    let mut source = HttpProbeSource::new(probe_url, config.probe_interval())?;
    let (mut monitor, events) = ConnectivityMonitor::start(&mut source).await?;

    let sync_task = tokio::spawn(Arc::clone(&orchestrator).run_on_connectivity(events));

    info!("Sync engine running. Waiting for shutdown signal...");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    info!("Initiating graceful shutdown...");

    sync_task.abort();
    monitor.stop();

    info!("Shutdown complete");
    Ok(())
}
