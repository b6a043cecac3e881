// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::store::models::{CachedLocation, CachedPhoto, OfflinePhoto};
use crate::store::traits::LocalStore;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_path: &Path) -> Result<Self, SyncError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self { pool };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                address TEXT,
                category TEXT,
                notes TEXT,
                rating REAL,
                last_synced_at TEXT NOT NULL,
                synced INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS photos (
                id TEXT PRIMARY KEY,
                location_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                caption TEXT,
                is_primary INTEGER NOT NULL,
                last_synced_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offline_queue (
                client_id TEXT PRIMARY KEY,
                location_id INTEGER NOT NULL,
                file_name TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                bytes BLOB NOT NULL,
                caption TEXT,
                latitude REAL,
                longitude REAL,
                queued_at TEXT NOT NULL,
                retry_count INTEGER NOT NULL,
                last_error TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Initialized SQLite cache schema");
        Ok(())
    }

    fn parse_timestamp(raw: String, column: &str) -> Result<DateTime<Utc>, SyncError> {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                SyncError::Storage(sqlx::Error::ColumnDecode {
                    index: column.to_string(),
                    source: Box::new(e),
                })
            })
    }

    fn location_from_row(row: &SqliteRow) -> Result<CachedLocation, SyncError> {
        Ok(CachedLocation {
            id: row.get::<i64, _>("id"),
            name: row.get::<String, _>("name"),
            latitude: row.get::<f64, _>("latitude"),
            longitude: row.get::<f64, _>("longitude"),
            address: row.get::<Option<String>, _>("address"),
            category: row.get::<Option<String>, _>("category"),
            notes: row.get::<Option<String>, _>("notes"),
            rating: row.get::<Option<f64>, _>("rating"),
            last_synced_at: Self::parse_timestamp(
                row.get::<String, _>("last_synced_at"),
                "last_synced_at",
            )?,
            synced: row.get::<bool, _>("synced"),
        })
    }

    fn photo_from_row(row: &SqliteRow) -> Result<CachedPhoto, SyncError> {
        Ok(CachedPhoto {
            id: row.get::<String, _>("id"),
            location_id: row.get::<i64, _>("location_id"),
            url: row.get::<String, _>("url"),
            caption: row.get::<Option<String>, _>("caption"),
            is_primary: row.get::<bool, _>("is_primary"),
            last_synced_at: Self::parse_timestamp(
                row.get::<String, _>("last_synced_at"),
                "last_synced_at",
            )?,
        })
    }

    fn queued_from_row(row: &SqliteRow) -> Result<OfflinePhoto, SyncError> {
        Ok(OfflinePhoto {
            client_id: row.get::<String, _>("client_id"),
            location_id: row.get::<i64, _>("location_id"),
            file_name: row.get::<String, _>("file_name"),
            mime_type: row.get::<String, _>("mime_type"),
            bytes: row.get::<Vec<u8>, _>("bytes"),
            caption: row.get::<Option<String>, _>("caption"),
            latitude: row.get::<Option<f64>, _>("latitude"),
            longitude: row.get::<Option<f64>, _>("longitude"),
            queued_at: Self::parse_timestamp(row.get::<String, _>("queued_at"), "queued_at")?,
            retry_count: row.get::<i64, _>("retry_count") as u32,
            last_error: row.get::<Option<String>, _>("last_error"),
        })
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn upsert_location(&self, location: &CachedLocation) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, latitude, longitude, address, category, notes, rating, last_synced_at, synced)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                address = excluded.address,
                category = excluded.category,
                notes = excluded.notes,
                rating = excluded.rating,
                last_synced_at = excluded.last_synced_at,
                synced = excluded.synced
            "#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(&location.address)
        .bind(&location.category)
        .bind(&location.notes)
        .bind(location.rating)
        .bind(location.last_synced_at.to_rfc3339())
        .bind(location.synced)
        .execute(&self.pool)
        .await?;

        debug!(location_id = location.id, "Upserted cached location");
        Ok(())
    }

    async fn get_location(&self, id: i64) -> Result<Option<CachedLocation>, SyncError> {
        let row = sqlx::query("SELECT * FROM locations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::location_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_locations(&self) -> Result<Vec<CachedLocation>, SyncError> {
        let rows = sqlx::query("SELECT * FROM locations ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;

        let mut locations = Vec::with_capacity(rows.len());
        for row in rows {
            locations.push(Self::location_from_row(&row)?);
        }

        Ok(locations)
    }

    async fn delete_location(&self, id: i64) -> Result<(), SyncError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM photos WHERE location_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM locations WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() > 0 {
            info!(location_id = id, "Deleted cached location");
        }

        Ok(())
    }

    async fn upsert_photo(&self, photo: &CachedPhoto) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO photos (id, location_id, url, caption, is_primary, last_synced_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                location_id = excluded.location_id,
                url = excluded.url,
                caption = excluded.caption,
                is_primary = excluded.is_primary,
                last_synced_at = excluded.last_synced_at
            "#,
        )
        .bind(&photo.id)
        .bind(photo.location_id)
        .bind(&photo.url)
        .bind(&photo.caption)
        .bind(photo.is_primary)
        .bind(photo.last_synced_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(photo_id = %photo.id, location_id = photo.location_id, "Upserted cached photo");
        Ok(())
    }

    async fn list_photos(&self, location_id: i64) -> Result<Vec<CachedPhoto>, SyncError> {
        let rows = sqlx::query("SELECT * FROM photos WHERE location_id = ?1 ORDER BY id")
            .bind(location_id)
            .fetch_all(&self.pool)
            .await?;

        let mut photos = Vec::with_capacity(rows.len());
        for row in rows {
            photos.push(Self::photo_from_row(&row)?);
        }

        Ok(photos)
    }

    async fn enqueue_photo(&self, photo: &OfflinePhoto) -> Result<(), SyncError> {
        let result = sqlx::query(
            r#"
            INSERT INTO offline_queue
                (client_id, location_id, file_name, mime_type, bytes, caption, latitude, longitude, queued_at, retry_count, last_error)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(client_id) DO NOTHING
            "#,
        )
        .bind(&photo.client_id)
        .bind(photo.location_id)
        .bind(&photo.file_name)
        .bind(&photo.mime_type)
        .bind(&photo.bytes)
        .bind(&photo.caption)
        .bind(photo.latitude)
        .bind(photo.longitude)
        .bind(photo.queued_at.to_rfc3339())
        .bind(photo.retry_count as i64)
        .bind(&photo.last_error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(client_id = %photo.client_id, location_id = photo.location_id, "Queued offline photo");
        } else {
            debug!(client_id = %photo.client_id, "Photo already queued, keeping existing entry");
        }

        Ok(())
    }

    async fn get_queued_photo(&self, client_id: &str) -> Result<Option<OfflinePhoto>, SyncError> {
        let row = sqlx::query("SELECT * FROM offline_queue WHERE client_id = ?1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::queued_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_queued_photos(&self) -> Result<Vec<OfflinePhoto>, SyncError> {
        let rows = sqlx::query("SELECT * FROM offline_queue ORDER BY queued_at ASC, client_id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut queued = Vec::with_capacity(rows.len());
        for row in rows {
            queued.push(Self::queued_from_row(&row)?);
        }

        Ok(queued)
    }

    async fn update_queued_photo(&self, photo: &OfflinePhoto) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            UPDATE offline_queue
            SET retry_count = ?2, last_error = ?3
            WHERE client_id = ?1
            "#,
        )
        .bind(&photo.client_id)
        .bind(photo.retry_count as i64)
        .bind(&photo.last_error)
        .execute(&self.pool)
        .await?;

        debug!(client_id = %photo.client_id, retry_count = photo.retry_count, "Updated queue entry");
        Ok(())
    }

    async fn remove_from_queue(&self, client_id: &str) -> Result<(), SyncError> {
        let result = sqlx::query("DELETE FROM offline_queue WHERE client_id = ?1")
            .bind(client_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!(client_id = %client_id, "Removed photo from upload queue");
        }

        Ok(())
    }

    async fn clear_locations(&self) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM locations").execute(&self.pool).await?;
        info!("Cleared cached locations");
        Ok(())
    }

    async fn clear_photos(&self) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM photos").execute(&self.pool).await?;
        info!("Cleared cached photos");
        Ok(())
    }

    async fn clear_queue(&self) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM offline_queue").execute(&self.pool).await?;
        info!("Cleared upload queue");
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), SyncError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM locations").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM photos").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM offline_queue").execute(&mut *tx).await?;

        tx.commit().await?;

        info!("Cleared all cached state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    async fn setup_test_store() -> (SqliteStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteStore::new(temp_file.path()).await.unwrap();
        (store, temp_file)
    }

    fn test_location(id: i64) -> CachedLocation {
        CachedLocation {
            id,
            name: format!("Location {id}"),
            latitude: 54.35,
            longitude: 18.65,
            address: Some("1 Quay St".to_string()),
            category: Some("viewpoint".to_string()),
            notes: None,
            rating: Some(4.0),
            last_synced_at: Utc::now(),
            synced: true,
        }
    }

    fn test_photo(id: &str, location_id: i64) -> CachedPhoto {
        CachedPhoto {
            id: id.to_string(),
            location_id,
            url: format!("https://img.example.com/{id}.jpg"),
            caption: None,
            is_primary: false,
            last_synced_at: Utc::now(),
        }
    }

    fn test_queued(client_id: &str, queued_at: DateTime<Utc>) -> OfflinePhoto {
        OfflinePhoto {
            client_id: client_id.to_string(),
            location_id: 42,
            file_name: "capture.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
            caption: Some("pier".to_string()),
            latitude: Some(54.35),
            longitude: Some(18.65),
            queued_at,
            retry_count: 0,
            last_error: None,
        }
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let (store, _db) = setup_test_store().await;
        assert!(store.list_locations().await.unwrap().is_empty());
        assert!(store.list_queued_photos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_location_roundtrip() {
        let (store, _db) = setup_test_store().await;
        let location = test_location(1);

        store.upsert_location(&location).await.unwrap();

        let retrieved = store.get_location(1).await.unwrap().unwrap();
        assert_eq!(retrieved.name, location.name);
        assert_eq!(retrieved.latitude, location.latitude);
        assert_eq!(retrieved.longitude, location.longitude);
        assert_eq!(retrieved.address, location.address);
        assert_eq!(retrieved.category, location.category);
        assert_eq!(retrieved.notes, location.notes);
        assert_eq!(retrieved.rating, location.rating);
        assert!(retrieved.synced);
    }

    #[tokio::test]
    async fn test_upsert_location_merges_by_id() {
        let (store, _db) = setup_test_store().await;
        let mut location = test_location(1);
        store.upsert_location(&location).await.unwrap();

        location.name = "Renamed".to_string();
        location.rating = Some(2.5);
        location.last_synced_at = location.last_synced_at + Duration::seconds(30);
        store.upsert_location(&location).await.unwrap();

        let all = store.list_locations().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Renamed");
        assert_eq!(all[0].rating, Some(2.5));
    }

    #[tokio::test]
    async fn test_list_locations_newest_first() {
        let (store, _db) = setup_test_store().await;
        for id in [3, 1, 2] {
            store.upsert_location(&test_location(id)).await.unwrap();
        }

        let ids: Vec<i64> = store
            .list_locations()
            .await
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_delete_location_removes_its_photos() {
        let (store, _db) = setup_test_store().await;
        store.upsert_location(&test_location(1)).await.unwrap();
        store.upsert_location(&test_location(2)).await.unwrap();
        store.upsert_photo(&test_photo("a", 1)).await.unwrap();
        store.upsert_photo(&test_photo("b", 2)).await.unwrap();

        store.delete_location(1).await.unwrap();

        assert!(store.get_location(1).await.unwrap().is_none());
        assert!(store.list_photos(1).await.unwrap().is_empty());
        assert_eq!(store.list_photos(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_photos_filters_by_location() {
        let (store, _db) = setup_test_store().await;
        store.upsert_photo(&test_photo("a", 1)).await.unwrap();
        store.upsert_photo(&test_photo("b", 1)).await.unwrap();
        store.upsert_photo(&test_photo("c", 2)).await.unwrap();

        let photos = store.list_photos(1).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos.iter().all(|p| p.location_id == 1));
    }

    #[tokio::test]
    async fn test_queue_fifo_order() {
        let (store, _db) = setup_test_store().await;
        let base = Utc::now();

        // Insert out of order; listing must come back oldest first.
        store
            .enqueue_photo(&test_queued("c2", base + Duration::seconds(10)))
            .await
            .unwrap();
        store.enqueue_photo(&test_queued("c1", base)).await.unwrap();
        store
            .enqueue_photo(&test_queued("c3", base + Duration::seconds(20)))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list_queued_photos()
            .await
            .unwrap()
            .iter()
            .map(|p| p.client_id.clone())
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[tokio::test]
    async fn test_enqueue_duplicate_keeps_original_entry() {
        let (store, _db) = setup_test_store().await;
        let original = test_queued("c1", Utc::now());
        store.enqueue_photo(&original).await.unwrap();

        let mut failed = original.clone();
        failed.retry_count = 2;
        failed.last_error = Some("network failure".to_string());
        store.update_queued_photo(&failed).await.unwrap();

        // Re-enqueueing the same capture must not reset retry state.
        let mut duplicate = original.clone();
        duplicate.queued_at = Utc::now() + Duration::seconds(60);
        store.enqueue_photo(&duplicate).await.unwrap();

        let queued = store.list_queued_photos().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].retry_count, 2);
        assert_eq!(queued[0].queued_at, original.queued_at);
    }

    #[tokio::test]
    async fn test_queued_photo_blob_roundtrip() {
        let (store, _db) = setup_test_store().await;
        let mut photo = test_queued("c1", Utc::now());
        photo.bytes = (0..=255).collect();
        store.enqueue_photo(&photo).await.unwrap();

        let retrieved = store.get_queued_photo("c1").await.unwrap().unwrap();
        assert_eq!(retrieved.bytes, photo.bytes);
        assert_eq!(retrieved.file_name, photo.file_name);
        assert_eq!(retrieved.mime_type, photo.mime_type);
        assert_eq!(retrieved.latitude, photo.latitude);
        assert_eq!(retrieved.longitude, photo.longitude);
    }

    #[tokio::test]
    async fn test_update_queued_photo_persists_retry_state() {
        let (store, _db) = setup_test_store().await;
        let mut photo = test_queued("c1", Utc::now());
        store.enqueue_photo(&photo).await.unwrap();

        photo.retry_count = 3;
        photo.last_error = Some("remote rejected request (409): already confirmed".to_string());
        store.update_queued_photo(&photo).await.unwrap();

        let retrieved = store.get_queued_photo("c1").await.unwrap().unwrap();
        assert_eq!(retrieved.retry_count, 3);
        assert!(retrieved.last_error.as_ref().unwrap().contains("409"));
        assert!(!retrieved.should_retry());
    }

    #[tokio::test]
    async fn test_remove_from_queue() {
        let (store, _db) = setup_test_store().await;
        store.enqueue_photo(&test_queued("c1", Utc::now())).await.unwrap();

        store.remove_from_queue("c1").await.unwrap();

        assert!(store.get_queued_photo("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_from_queue_not_exists() {
        let (store, _db) = setup_test_store().await;
        store.remove_from_queue("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (store, _db) = setup_test_store().await;
        store.upsert_location(&test_location(1)).await.unwrap();
        store.upsert_photo(&test_photo("a", 1)).await.unwrap();
        store.enqueue_photo(&test_queued("c1", Utc::now())).await.unwrap();

        store.clear_all().await.unwrap();

        assert!(store.list_locations().await.unwrap().is_empty());
        assert!(store.list_photos(1).await.unwrap().is_empty());
        assert!(store.list_queued_photos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let store = SqliteStore::new(temp_file.path()).await.unwrap();
            store.enqueue_photo(&test_queued("c1", Utc::now())).await.unwrap();
        }

        let reopened = SqliteStore::new(temp_file.path()).await.unwrap();
        let queued = reopened.list_queued_photos().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].client_id, "c1");
    }
}
