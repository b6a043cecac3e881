// SPDX-License-Identifier: GPL-3.0-only
pub mod orchestrator;

pub use orchestrator::{DrainSummary, PullSummary, SyncOrchestrator, SyncOutcome, SyncReport};
