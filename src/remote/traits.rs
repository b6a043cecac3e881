// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::store::models::OfflinePhoto;

/// A location as the backend lists it, with its photos nested when the
/// listing was requested with `include_photos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLocation {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub photos: Vec<RemotePhoto>,
}

/// A confirmed photo record as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePhoto {
    pub id: String,
    #[serde(default)]
    pub location_id: Option<i64>,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Server-issued, time-bounded credentials for one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCredentials {
    /// Server-assigned photo id, issued before any bytes move
    pub photo_id: String,

    /// Signed upload target on the image host
    pub upload_url: String,

    /// Destination folder on the host, as the backend issued it
    #[serde(default)]
    pub folder: Option<String>,

    pub signature: String,

    /// Credential expiry as a Unix timestamp
    pub expire_at: i64,
}

/// What the image host hands back after a successful byte transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedFile {
    pub file_id: String,
    pub url: String,
}

/// The authoritative listing pull consumed by the pull phase.
#[async_trait]
pub trait RemoteListing: Send + Sync {
    /// Fetch every location (and nested photos) visible to the caller
    async fn fetch_locations(&self) -> Result<Vec<RemoteLocation>, SyncError>;
}

/// The three-step photo upload protocol, one call per step.
#[async_trait]
pub trait UploadPipeline: Send + Sync {
    /// Step 1: register the pending photo and obtain signed credentials
    async fn request_credentials(
        &self,
        photo: &OfflinePhoto,
    ) -> Result<UploadCredentials, SyncError>;

    /// Step 2: move the raw bytes to the image host
    async fn transfer(
        &self,
        credentials: &UploadCredentials,
        photo: &OfflinePhoto,
    ) -> Result<HostedFile, SyncError>;

    /// Step 3: finalize the photo record server-side
    async fn confirm(&self, photo_id: &str, hosted: &HostedFile) -> Result<RemotePhoto, SyncError>;
}
