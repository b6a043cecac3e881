// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::remote::traits::{HostedFile, RemotePhoto, UploadCredentials, UploadPipeline};
use crate::store::models::OfflinePhoto;
use crate::utils::normalize_folder;

/// HTTP implementation of the three-step upload protocol: credentials from
/// the backend, bytes to the image host, confirmation back to the backend.
#[derive(Debug, Clone)]
pub struct HttpUploadPipeline {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpUploadPipeline {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        crate::utils::validate_url(&base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("placeshot-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn build_post_request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.client.post(&url);

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        request
    }
}

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    file_name: &'a str,
    mime_type: &'a str,
    size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    captured_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ConfirmRequest<'a> {
    file_id: &'a str,
    url: &'a str,
}

#[async_trait]
impl UploadPipeline for HttpUploadPipeline {
    async fn request_credentials(
        &self,
        photo: &OfflinePhoto,
    ) -> Result<UploadCredentials, SyncError> {
        let body = CredentialsRequest {
            file_name: &photo.file_name,
            mime_type: &photo.mime_type,
            size_bytes: photo.bytes.len(),
            caption: photo.caption.as_deref(),
            latitude: photo.latitude,
            longitude: photo.longitude,
            captured_at: photo.queued_at,
        };

        let response = self
            .build_post_request(&format!("locations/{}/photos/uploads", photo.location_id))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, text));
        }

        let credentials: UploadCredentials = response.json().await?;
        if credentials.photo_id.is_empty() || credentials.upload_url.is_empty() {
            return Err(SyncError::MalformedResponse(
                "credentials response missing photo id or upload target".to_string(),
            ));
        }

        debug!(
            client_id = %photo.client_id,
            photo_id = %credentials.photo_id,
            "Issued upload credentials"
        );
        Ok(credentials)
    }

    async fn transfer(
        &self,
        credentials: &UploadCredentials,
        photo: &OfflinePhoto,
    ) -> Result<HostedFile, SyncError> {
        crate::utils::validate_url(&credentials.upload_url)
            .map_err(|e| SyncError::MalformedResponse(format!("bad upload target: {e}")))?;

        let file_part = Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.mime_type)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("fileName", photo.file_name.clone())
            .text("signature", credentials.signature.clone())
            .text("expire", credentials.expire_at.to_string());

        if let Some(ref folder) = credentials.folder {
            let folder = normalize_folder(folder);
            if !folder.is_empty() {
                form = form.text("folder", folder.to_string());
            }
        }

        let response = self
            .client
            .post(&credentials.upload_url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, text));
        }

        let hosted: HostedFile = response.json().await?;
        if hosted.file_id.is_empty() || hosted.url.is_empty() {
            return Err(SyncError::MalformedResponse(
                "image host response missing file identifier or URL".to_string(),
            ));
        }

        debug!(
            photo_id = %credentials.photo_id,
            file_id = %hosted.file_id,
            "Transferred photo bytes to image host"
        );
        Ok(hosted)
    }

    async fn confirm(&self, photo_id: &str, hosted: &HostedFile) -> Result<RemotePhoto, SyncError> {
        let body = ConfirmRequest {
            file_id: &hosted.file_id,
            url: &hosted.url,
        };

        let response = self
            .build_post_request(&format!("photos/{}/confirm", photo_id))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, text));
        }

        let confirmed: RemotePhoto = response.json().await?;
        if confirmed.id.is_empty() || confirmed.url.is_empty() {
            return Err(SyncError::MalformedResponse(
                "confirm response missing photo id or URL".to_string(),
            ));
        }

        info!(photo_id = %confirmed.id, "Confirmed photo upload");
        Ok(confirmed)
    }
}
