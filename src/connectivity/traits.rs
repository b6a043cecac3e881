// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

/// Edge-triggered connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Connected,
    Disconnected,
}

/// The platform's reachability primitive, abstracted.
///
/// Implementations push raw boolean readings into the returned channel
/// whenever the platform reports network state. Readings may repeat for a
/// steady state; deduplication into edges is the monitor's job.
#[async_trait]
pub trait ReachabilitySource: Send + Sync {
    /// Start observing and return the stream of raw readings
    async fn observe(&mut self) -> anyhow::Result<Receiver<bool>>;
}
