// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connectivity::traits::{ConnectivityEvent, ReachabilitySource};

/// Watches a reachability source and exposes the current state plus an
/// edge-triggered event stream.
///
/// The baseline is disconnected, so a device that is online when the monitor
/// starts emits exactly one initial `Connected` edge. Steady-state readings
/// are swallowed.
pub struct ConnectivityMonitor {
    connected: Arc<AtomicBool>,
    forward_task: Option<JoinHandle<()>>,
}

impl ConnectivityMonitor {
    pub async fn start(
        source: &mut dyn ReachabilitySource,
    ) -> anyhow::Result<(Self, mpsc::Receiver<ConnectivityEvent>)> {
        let mut readings = source.observe().await?;
        let (event_tx, event_rx) = mpsc::channel(16);

        let connected = Arc::new(AtomicBool::new(false));
        let connected_task = Arc::clone(&connected);

        let forward_task = tokio::spawn(async move {
            let mut last = false;
            while let Some(reading) = readings.recv().await {
                if reading == last {
                    continue;
                }
                last = reading;
                connected_task.store(reading, Ordering::Release);

                let event = if reading {
                    ConnectivityEvent::Connected
                } else {
                    ConnectivityEvent::Disconnected
                };
                debug!(?event, "Connectivity edge");
                if let Err(e) = event_tx.try_send(event) {
                    warn!(error = %e, "Failed to forward connectivity event, receiver may be closed");
                }
            }
        });

        info!("Started connectivity monitor");
        Ok((
            Self {
                connected,
                forward_task: Some(forward_task),
            },
            event_rx,
        ))
    }

    /// Current reading, never blocks.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.forward_task.take() {
            task.abort();
            info!("Stopped connectivity monitor");
        }
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A reachability source fed by the embedder.
///
/// The UI shell (or a test) pushes readings from the platform's network
/// callback into the sender half.
pub struct ChannelReachability {
    readings: Option<mpsc::Receiver<bool>>,
}

impl ChannelReachability {
    pub fn new() -> (mpsc::Sender<bool>, Self) {
        let (tx, rx) = mpsc::channel(16);
        (tx, Self { readings: Some(rx) })
    }
}

#[async_trait]
impl ReachabilitySource for ChannelReachability {
    async fn observe(&mut self) -> anyhow::Result<mpsc::Receiver<bool>> {
        self.readings
            .take()
            .ok_or_else(|| anyhow::anyhow!("Reachability source already observed"))
    }
}

/// Reachability stand-in for headless deployments without a platform
/// network callback: probes a backend health endpoint on an interval and
/// pushes the outcome as readings. The monitor stays purely push-driven.
pub struct HttpProbeSource {
    client: reqwest::Client,
    probe_url: String,
    interval: Duration,
}

impl HttpProbeSource {
    pub fn new(probe_url: String, interval: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("placeshot-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            probe_url,
            interval,
        })
    }
}

#[async_trait]
impl ReachabilitySource for HttpProbeSource {
    async fn observe(&mut self) -> anyhow::Result<mpsc::Receiver<bool>> {
        let (tx, rx) = mpsc::channel(16);
        let client = self.client.clone();
        let probe_url = self.probe_url.clone();
        let mut ticker = tokio::time::interval(self.interval);

        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                let reachable = match client.head(&probe_url).send().await {
                    Ok(response) => response.status().is_success(),
                    Err(_) => false,
                };
                if tx.send(reachable).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}
