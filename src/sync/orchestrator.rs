// SPDX-License-Identifier: GPL-3.0-only
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::connectivity::ConnectivityEvent;
use crate::error::SyncError;
use crate::remote::{RemoteListing, UploadPipeline};
use crate::store::{CachedLocation, CachedPhoto, LocalStore, OfflinePhoto};

/// What a `sync_all` call observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The pass ran to completion
    Completed(SyncReport),
    /// Another pass was already in flight; this call did nothing
    AlreadyRunning,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub locations: usize,
    pub photos: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub uploaded: usize,
    pub failed: usize,
    /// Entries over the retry bound, left untouched
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pull: PullSummary,
    pub drain: DrainSummary,
}

/// Resets the in-flight flag when a pass ends, normally or by panic.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Coordinates the pull and drain phases over injected collaborators.
///
/// At most one sync pass runs at a time; concurrent `sync_all` callers
/// observe `SyncOutcome::AlreadyRunning` instead of a queued second pass.
pub struct SyncOrchestrator {
    store: Arc<dyn LocalStore>,
    listing: Arc<dyn RemoteListing>,
    pipeline: Arc<dyn UploadPipeline>,
    in_flight: AtomicBool,
    progress_tx: watch::Sender<f64>,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn LocalStore>,
        listing: Arc<dyn RemoteListing>,
        pipeline: Arc<dyn UploadPipeline>,
    ) -> Self {
        let (progress_tx, _) = watch::channel(0.0);
        Self {
            store,
            listing,
            pipeline,
            in_flight: AtomicBool::new(false),
            progress_tx,
        }
    }

    /// Fractional completion of the current pass: 0.0 at start, 0.5 after
    /// the pull phase, 1.0 after the drain phase.
    pub fn progress(&self) -> watch::Receiver<f64> {
        self.progress_tx.subscribe()
    }

    /// Run a full pass: pull remote state, then drain the upload queue.
    ///
    /// A listing failure is not fatal to the pass — queued captures still
    /// deserve their attempt — but storage failures abort immediately.
    pub async fn sync_all(&self) -> Result<SyncOutcome, SyncError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Sync pass already in flight, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let _guard = InFlightGuard(&self.in_flight);

        info!("Starting sync pass");
        let _ = self.progress_tx.send(0.0);
        let mut report = SyncReport::default();

        match self.pull_locations().await {
            Ok(pull) => report.pull = pull,
            Err(err @ SyncError::Storage(_)) => return Err(err),
            Err(err) => {
                warn!(error = %err, "Listing pull failed, continuing with queue drain");
            }
        }
        let _ = self.progress_tx.send(0.5);

        report.drain = self.drain_queue().await?;
        let _ = self.progress_tx.send(1.0);

        info!(
            locations = report.pull.locations,
            uploaded = report.drain.uploaded,
            failed = report.drain.failed,
            "Sync pass complete"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// Pull the authoritative listing into the local cache.
    ///
    /// Every returned location and nested photo is upserted; entities absent
    /// from the response are left alone — the listing is not a deletion
    /// signal.
    pub async fn pull_locations(&self) -> Result<PullSummary, SyncError> {
        let listing = self.listing.fetch_locations().await?;
        let now = Utc::now();
        let mut summary = PullSummary::default();

        for location in &listing {
            self.store
                .upsert_location(&CachedLocation::from_remote(location, now))
                .await?;
            summary.locations += 1;

            for photo in &location.photos {
                self.store
                    .upsert_photo(&CachedPhoto::from_remote(location.id, photo, now))
                    .await?;
                summary.photos += 1;
            }
        }

        debug!(
            locations = summary.locations,
            photos = summary.photos,
            "Pull phase complete"
        );
        Ok(summary)
    }

    /// Drain the upload queue oldest-first.
    ///
    /// A single entry's failure is recorded on the entry and never aborts
    /// the pass; entries over the retry bound are skipped without an
    /// attempt. Storage failures abort.
    pub async fn drain_queue(&self) -> Result<DrainSummary, SyncError> {
        let queued = self.store.list_queued_photos().await?;
        let mut summary = DrainSummary::default();

        for mut photo in queued {
            if !photo.should_retry() {
                debug!(
                    client_id = %photo.client_id,
                    retry_count = photo.retry_count,
                    "Skipping exhausted queue entry"
                );
                summary.skipped += 1;
                continue;
            }

            match self.upload_one(&photo).await {
                Ok(cached) => {
                    // Cache first, then dequeue: losing the race the other
                    // way around would drop the photo until the next pull.
                    self.store.upsert_photo(&cached).await?;
                    self.store.remove_from_queue(&photo.client_id).await?;
                    info!(
                        client_id = %photo.client_id,
                        photo_id = %cached.id,
                        location_id = cached.location_id,
                        "Uploaded queued photo"
                    );
                    summary.uploaded += 1;
                }
                Err(err @ SyncError::Storage(_)) => return Err(err),
                Err(err) => {
                    photo.record_failure(&err);
                    self.store.update_queued_photo(&photo).await?;
                    warn!(
                        client_id = %photo.client_id,
                        retry_count = photo.retry_count,
                        error = %err,
                        "Upload attempt failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        debug!(
            uploaded = summary.uploaded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Drain phase complete"
        );
        Ok(summary)
    }

    async fn upload_one(&self, photo: &OfflinePhoto) -> Result<CachedPhoto, SyncError> {
        let credentials = self.pipeline.request_credentials(photo).await?;
        let hosted = self.pipeline.transfer(&credentials, photo).await?;
        let confirmed = self.pipeline.confirm(&credentials.photo_id, &hosted).await?;
        Ok(CachedPhoto::from_remote(photo.location_id, &confirmed, Utc::now()))
    }

    /// Queue entries that exhausted their automatic retries and now need
    /// explicit user action.
    pub async fn exhausted_uploads(&self) -> Result<Vec<OfflinePhoto>, SyncError> {
        Ok(self
            .store
            .list_queued_photos()
            .await?
            .into_iter()
            .filter(|photo| !photo.should_retry())
            .collect())
    }

    /// Reset an entry's retry bookkeeping so the next pass picks it up again.
    pub async fn retry_upload(&self, client_id: &str) -> Result<(), SyncError> {
        let Some(mut photo) = self.store.get_queued_photo(client_id).await? else {
            return Ok(());
        };

        photo.retry_count = 0;
        photo.last_error = None;
        self.store.update_queued_photo(&photo).await?;

        info!(client_id = %client_id, "Reset retry state for queued photo");
        Ok(())
    }

    /// Explicit user discard of a queued capture.
    pub async fn discard_upload(&self, client_id: &str) -> Result<(), SyncError> {
        self.store.remove_from_queue(client_id).await
    }

    /// Drive sync passes from connectivity edges. The `Connected` edge is
    /// the sole automatic trigger.
    pub async fn run_on_connectivity(
        self: Arc<Self>,
        mut events: mpsc::Receiver<ConnectivityEvent>,
    ) {
        info!("Connectivity-driven sync loop started");
        while let Some(event) = events.recv().await {
            match event {
                ConnectivityEvent::Connected => {
                    info!("Connectivity restored, starting sync pass");
                    match self.sync_all().await {
                        Ok(SyncOutcome::Completed(report)) => {
                            debug!(?report, "Connectivity-triggered pass finished");
                        }
                        Ok(SyncOutcome::AlreadyRunning) => {}
                        Err(err) => {
                            error!(error = %err, "Connectivity-triggered pass failed");
                        }
                    }
                }
                ConnectivityEvent::Disconnected => {
                    debug!("Connectivity lost");
                }
            }
        }
    }
}
