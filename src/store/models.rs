// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;
use crate::remote::{RemoteLocation, RemotePhoto};

/// Automatic upload attempts per queue entry. Entries that reach the bound
/// stay in the queue but require explicit user action.
pub const MAX_UPLOAD_ATTEMPTS: u32 = 3;

/// Local mirror of a server-side location record.
///
/// Pure projection of server state: created or overwritten whenever a
/// listing fetch succeeds, never edited locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLocation {
    /// Server-assigned location id
    pub id: i64,

    /// Display name
    pub name: String,

    pub latitude: f64,
    pub longitude: f64,

    pub address: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<f64>,

    /// When this row was last refreshed from the server
    pub last_synced_at: DateTime<Utc>,

    pub synced: bool,
}

impl CachedLocation {
    pub fn from_remote(remote: &RemoteLocation, synced_at: DateTime<Utc>) -> Self {
        Self {
            id: remote.id,
            name: remote.name.clone(),
            latitude: remote.latitude,
            longitude: remote.longitude,
            address: remote.address.clone(),
            category: remote.category.clone(),
            notes: remote.notes.clone(),
            rating: remote.rating,
            last_synced_at: synced_at,
            synced: true,
        }
    }
}

/// Local mirror of confirmed server-side photo metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPhoto {
    /// Server-assigned photo id
    pub id: String,

    /// Owning location
    pub location_id: i64,

    /// Canonical image-host URL
    pub url: String,

    pub caption: Option<String>,
    pub is_primary: bool,

    pub last_synced_at: DateTime<Utc>,
}

impl CachedPhoto {
    /// Build a cache row from a listing photo nested under `location_id`.
    pub fn from_remote(location_id: i64, remote: &RemotePhoto, synced_at: DateTime<Utc>) -> Self {
        Self {
            id: remote.id.clone(),
            location_id: remote.location_id.unwrap_or(location_id),
            url: remote.url.clone(),
            caption: remote.caption.clone(),
            is_primary: remote.is_primary,
            last_synced_at: synced_at,
        }
    }
}

/// A photo captured while offline, or whose upload has not yet succeeded.
///
/// Keyed by a client-generated id that stays stable across retries and is
/// independent of any server id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflinePhoto {
    /// Client-generated identifier (UUID v4)
    pub client_id: String,

    /// Target location for the upload
    pub location_id: i64,

    pub file_name: String,
    pub mime_type: String,

    /// Raw image bytes
    pub bytes: Vec<u8>,

    pub caption: Option<String>,

    /// Capture coordinates, when the device had a GPS fix
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub queued_at: DateTime<Utc>,

    /// Failed automatic attempts so far
    pub retry_count: u32,

    /// Message from the most recent failed attempt
    pub last_error: Option<String>,
}

impl OfflinePhoto {
    pub fn new(location_id: i64, file_name: String, mime_type: String, bytes: Vec<u8>) -> Self {
        Self {
            client_id: Uuid::new_v4().to_string(),
            location_id,
            file_name,
            mime_type,
            bytes,
            caption: None,
            latitude: None,
            longitude: None,
            queued_at: Utc::now(),
            retry_count: 0,
            last_error: None,
        }
    }

    /// Whether the entry is still eligible for automatic drain passes.
    pub fn should_retry(&self) -> bool {
        self.retry_count < MAX_UPLOAD_ATTEMPTS
    }

    /// Record a failed upload attempt.
    pub fn record_failure(&mut self, error: &SyncError) {
        self.retry_count += 1;
        self.last_error = Some(error.to_string());
    }
}
