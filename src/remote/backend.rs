// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::error::SyncError;
use crate::remote::traits::{RemoteListing, RemoteLocation};

/// Backend client for the pull phase.
#[derive(Debug, Clone)]
pub struct BackendListingService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BackendListingService {
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

    fn build_request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.client.get(&url);

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        request
    }
}

#[derive(Deserialize)]
struct ListingResponse {
    locations: Vec<RemoteLocation>,
}

#[async_trait]
impl RemoteListing for BackendListingService {
    async fn fetch_locations(&self) -> Result<Vec<RemoteLocation>, SyncError> {
        let response = self
            .build_request("locations?include_photos=true")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, body));
        }

        let listing: ListingResponse = response.json().await?;
        info!(count = listing.locations.len(), "Fetched location listing");

        Ok(listing.locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_for(server: &mockito::Server) -> BackendListingService {
        BackendListingService::new(
            server.url(),
            Some("test-token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_locations_parses_listing() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "locations": [
                {
                    "id": 42,
                    "name": "Harbor View",
                    "latitude": 54.35,
                    "longitude": 18.65,
                    "rating": 4.5,
                    "photos": [
                        {
                            "id": "ph-1",
                            "location_id": 42,
                            "url": "https://img.example.com/ph-1.jpg",
                            "is_primary": true
                        }
                    ]
                },
                {
                    "id": 7,
                    "name": "Old Town",
                    "latitude": 54.34,
                    "longitude": 18.64
                }
            ]
        });
        let mock = server
            .mock("GET", "/locations?include_photos=true")
            .match_header("Authorization", "Bearer test-token")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let locations = service_for(&server).fetch_locations().await.unwrap();

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].id, 42);
        assert_eq!(locations[0].photos.len(), 1);
        assert_eq!(locations[0].photos[0].id, "ph-1");
        assert_eq!(locations[1].photos.len(), 0);
        assert_eq!(locations[1].address, None);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_locations_unauthorized_is_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/locations?include_photos=true")
            .with_status(401)
            .with_body("token expired")
            .create_async()
            .await;

        let err = service_for(&server).fetch_locations().await.unwrap_err();
        match err {
            SyncError::RemoteRejection { status, .. } => assert_eq!(status, 401),
            other => panic!("expected RemoteRejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_locations_server_error_is_network() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/locations?include_photos=true")
            .with_status(503)
            .create_async()
            .await;

        let err = service_for(&server).fetch_locations().await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_locations_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/locations?include_photos=true")
            .with_status(200)
            .with_body("{\"locations\": [{\"id\": \"not-a-number\"}]}")
            .create_async()
            .await;

        let err = service_for(&server).fetch_locations().await.unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse(_)));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = BackendListingService::new(
            "ftp://example.com".to_string(),
            None,
            Duration::from_secs(5),
        );
        assert!(result.is_err());
    }
}
