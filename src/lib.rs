// SPDX-License-Identifier: GPL-3.0-only
//! Offline-first synchronization engine for the Placeshot companion client.
//!
//! The engine keeps a durable local cache of locations and photo metadata,
//! queues photos captured while offline, and reconciles the queue against
//! the remote three-step upload protocol whenever connectivity returns.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod logging;
pub mod remote;
pub mod store;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::Config;
pub use error::SyncError;
pub use sync::{SyncOrchestrator, SyncOutcome, SyncReport};
