//! Local durable store of fetched recipes.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::{self, Pool, StoredRecord};
use crate::model::Recipe;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to open local store: {0}")]
    OpenFailed(String),
    #[error("failed to read local store: {0}")]
    QueryFailed(String),
    #[error("failed to persist recipes: {0}")]
    PersistFailed(String),
    #[error("failed to delete recipes: {0}")]
    DeleteFailed(String),
}

/// Keyed storage of previously fetched recipes. Never initiates a fetch.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn is_empty(&self) -> Result<bool, StoreError>;

    /// Every stored record ordered by name ascending.
    async fn all(&self) -> Result<Vec<StoredRecord>, StoreError>;

    async fn find(&self, id: &str) -> Result<Option<StoredRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Atomically insert the records whose id is not stored yet; returns how
    /// many were inserted.
    async fn insert_if_absent(&self, recipes: &[Recipe]) -> Result<u64, StoreError>;

    async fn clear_all(&self) -> Result<(), StoreError>;
}

/// SQLite-backed store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    /// Wrap an existing pool; migrations must already have run.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = db::init_pool(database_url)
            .await
            .map_err(|err| StoreError::OpenFailed(format!("{err:#}")))?;
        db::run_migrations(&pool)
            .await
            .map_err(|err| StoreError::OpenFailed(format!("{err:#}")))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

fn query_failed(err: sqlx::Error) -> StoreError {
    StoreError::QueryFailed(err.to_string())
}

#[async_trait]
impl RecipeStore for SqliteStore {
    async fn is_empty(&self) -> Result<bool, StoreError> {
        db::has_recipes(&self.pool)
            .await
            .map(|any| !any)
            .map_err(query_failed)
    }

    async fn all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        db::list_recipes(&self.pool).await.map_err(query_failed)
    }

    async fn find(&self, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        db::find_recipe(&self.pool, id).await.map_err(query_failed)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        db::count_recipes(&self.pool)
            .await
            .map(|n| n.max(0) as u64)
            .map_err(query_failed)
    }

    async fn insert_if_absent(&self, recipes: &[Recipe]) -> Result<u64, StoreError> {
        db::insert_recipes_if_absent(&self.pool, recipes)
            .await
            .map_err(|err| StoreError::PersistFailed(err.to_string()))
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        db::delete_all_recipes(&self.pool)
            .await
            .map(|_| ())
            .map_err(|err| StoreError::DeleteFailed(err.to_string()))
    }
}
