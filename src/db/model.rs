//! Stored entity returned by the repository.

use chrono::{DateTime, Utc};

use crate::model::Recipe;

/// Durable form of a `Recipe`, keyed by `id`. Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: String,
    pub cuisine: String,
    pub name: String,
    pub photo_url_large: String,
    pub photo_url_small: String,
    pub source_url: Option<String>,
    pub youtube_url: Option<String>,
    pub stored_at: DateTime<Utc>,
}

impl From<StoredRecord> for Recipe {
    fn from(r: StoredRecord) -> Self {
        Recipe {
            cuisine: r.cuisine,
            name: r.name,
            photo_url_large: r.photo_url_large,
            photo_url_small: r.photo_url_small,
            source_url: r.source_url,
            id: r.id,
            youtube_url: r.youtube_url,
        }
    }
}
