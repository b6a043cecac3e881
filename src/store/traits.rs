// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;

use crate::error::SyncError;
use crate::store::models::{CachedLocation, CachedPhoto, OfflinePhoto};

/// Durable, restart-surviving persistence for the cache and upload queue.
///
/// Every write is atomic per call. Storage errors propagate as
/// `SyncError::Storage`; the store itself never retries.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Insert a location, or overwrite the mutable fields of an existing one
    async fn upsert_location(&self, location: &CachedLocation) -> Result<(), SyncError>;

    /// Fetch a location by server id
    async fn get_location(&self, id: i64) -> Result<Option<CachedLocation>, SyncError>;

    /// All cached locations, newest-created first
    async fn list_locations(&self) -> Result<Vec<CachedLocation>, SyncError>;

    /// Remove a location and its cached photos
    async fn delete_location(&self, id: i64) -> Result<(), SyncError>;

    /// Insert a photo, or overwrite the mutable fields of an existing one
    async fn upsert_photo(&self, photo: &CachedPhoto) -> Result<(), SyncError>;

    /// Cached photos belonging to one location
    async fn list_photos(&self, location_id: i64) -> Result<Vec<CachedPhoto>, SyncError>;

    /// Add a captured photo to the upload queue. A client id already in the
    /// queue is left untouched, preserving its position and retry state.
    async fn enqueue_photo(&self, photo: &OfflinePhoto) -> Result<(), SyncError>;

    /// Fetch a queue entry by client id
    async fn get_queued_photo(&self, client_id: &str) -> Result<Option<OfflinePhoto>, SyncError>;

    /// All queued photos, oldest first
    async fn list_queued_photos(&self) -> Result<Vec<OfflinePhoto>, SyncError>;

    /// Persist retry bookkeeping for an existing queue entry
    async fn update_queued_photo(&self, photo: &OfflinePhoto) -> Result<(), SyncError>;

    /// Remove a queue entry
    async fn remove_from_queue(&self, client_id: &str) -> Result<(), SyncError>;

    async fn clear_locations(&self) -> Result<(), SyncError>;

    async fn clear_photos(&self) -> Result<(), SyncError>;

    async fn clear_queue(&self) -> Result<(), SyncError>;

    /// Sign-out wipe: all three tables in one transaction
    async fn clear_all(&self) -> Result<(), SyncError>;
}
