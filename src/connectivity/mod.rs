// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod monitor;

pub use traits::{ConnectivityEvent, ReachabilitySource};
pub use monitor::{ChannelReachability, ConnectivityMonitor, HttpProbeSource};
