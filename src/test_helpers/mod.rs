// SPDX-License-Identifier: GPL-3.0-only
use chrono::Utc;
use tempfile::NamedTempFile;

use crate::remote::RemoteLocation;
use crate::store::{OfflinePhoto, SqliteStore};

/// Create a temp-file-backed store for tests. The temp file must be kept
/// alive for the lifetime of the store.
pub async fn setup_test_store() -> (SqliteStore, NamedTempFile) {
    let temp_file = NamedTempFile::new().expect("Failed to create temp database file");
    let store = SqliteStore::new(temp_file.path())
        .await
        .expect("Failed to open test store");
    (store, temp_file)
}

/// A queue entry with a fixed client id, ready for upload.
pub fn queued_photo(client_id: &str, location_id: i64) -> OfflinePhoto {
    OfflinePhoto {
        client_id: client_id.to_string(),
        location_id,
        file_name: format!("{client_id}.jpg"),
        mime_type: "image/jpeg".to_string(),
        bytes: vec![0xff, 0xd8, 0xff, 0xe0],
        caption: None,
        latitude: Some(54.35),
        longitude: Some(18.65),
        queued_at: Utc::now(),
        retry_count: 0,
        last_error: None,
    }
}

/// A listing entry without nested photos.
pub fn remote_location(id: i64) -> RemoteLocation {
    RemoteLocation {
        id,
        name: format!("Location {id}"),
        latitude: 54.35,
        longitude: 18.65,
        address: None,
        category: None,
        notes: None,
        rating: None,
        photos: Vec::new(),
    }
}
