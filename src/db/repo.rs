use super::model::StoredRecord;
use crate::config::expand_home;
use crate::model::Recipe;
use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

const RECORD_COLUMNS: &str =
    "uuid, cuisine, name, photo_url_large, photo_url_small, source_url, youtube_url, stored_at";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)?
        .create_if_missing(true)
        // Enable WAL and stricter durability.
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    let mut pool_options = SqlitePoolOptions::new().max_connections(4);
    if normalized.starts_with("sqlite::memory") {
        // Every in-memory connection is its own database; keep exactly one alive.
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = pool_options.connect_with(options).await?;
    Ok(pool)
}

/// Normalize a file-backed URL to `sqlite://<path>`, expanding `~/` and
/// creating the parent directory. In-memory and non-sqlite URLs pass through.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = rest.split_once('?').map_or((rest, None), |(p, q)| (p, Some(q)));
    if path.is_empty() {
        return url.to_string();
    }

    let path = expand_home(path);
    if let Some(parent) = Path::new(&path).parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = std::fs::create_dir_all(parent);
    }

    match query {
        Some(q) => format!("sqlite://{path}?{q}"),
        None => format!("sqlite://{path}"),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn row_to_record(row: &SqliteRow) -> Result<StoredRecord, sqlx::Error> {
    Ok(StoredRecord {
        id: row.try_get("uuid")?,
        cuisine: row.try_get("cuisine")?,
        name: row.try_get("name")?,
        photo_url_large: row.try_get("photo_url_large")?,
        photo_url_small: row.try_get("photo_url_small")?,
        source_url: row.try_get("source_url")?,
        youtube_url: row.try_get("youtube_url")?,
        stored_at: row.try_get("stored_at")?,
    })
}

#[instrument(skip_all)]
pub async fn count_recipes(pool: &Pool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await
}

#[instrument(skip_all)]
pub async fn has_recipes(pool: &Pool) -> Result<bool, sqlx::Error> {
    let any: Option<i64> = sqlx::query_scalar("SELECT 1 FROM recipes LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(any.is_some())
}

/// All stored recipes by name, ties broken by id for a deterministic listing.
#[instrument(skip_all)]
pub async fn list_recipes(pool: &Pool) -> Result<Vec<StoredRecord>, sqlx::Error> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM recipes ORDER BY name ASC, uuid ASC");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(row_to_record).collect()
}

#[instrument(skip_all)]
pub async fn find_recipe(pool: &Pool, id: &str) -> Result<Option<StoredRecord>, sqlx::Error> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM recipes WHERE uuid = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(row_to_record).transpose()
}

/// Insert every recipe whose id is not stored yet, in one transaction.
/// Returns the number of rows actually inserted. On error nothing is committed.
#[instrument(skip_all, fields(batch = recipes.len()))]
pub async fn insert_recipes_if_absent(pool: &Pool, recipes: &[Recipe]) -> Result<u64, sqlx::Error> {
    let stored_at = Utc::now();
    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for r in recipes {
        let res = sqlx::query(
            "INSERT INTO recipes (uuid, cuisine, name, photo_url_large, photo_url_small, source_url, youtube_url, stored_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(uuid) DO NOTHING",
        )
        .bind(&r.id)
        .bind(&r.cuisine)
        .bind(&r.name)
        .bind(&r.photo_url_large)
        .bind(&r.photo_url_small)
        .bind(r.source_url.as_deref())
        .bind(r.youtube_url.as_deref())
        .bind(stored_at)
        .execute(&mut *tx)
        .await?;
        inserted += res.rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

#[instrument(skip_all)]
pub async fn delete_all_recipes(pool: &Pool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM recipes").execute(pool).await?;
    Ok(res.rows_affected())
}
