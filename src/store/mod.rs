// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod traits;
pub mod sqlite;

pub use models::{CachedLocation, CachedPhoto, OfflinePhoto, MAX_UPLOAD_ATTEMPTS};
pub use traits::LocalStore;
pub use sqlite::SqliteStore;
