//! SQLite persistence for the feed cache.
//!
//! Holds at most one snapshot at a time: a singleton row replaced wholesale on
//! every write. Readers see either the previous snapshot or the new one in
//! full, never a mix. Read-side failures degrade to a cache miss rather than
//! propagating — a broken cache file must not take the feed down.

mod error;

pub use error::{Result, StoreError};

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::warn;

use lanefeed_common::{CacheSnapshot, Post, SnapshotMeta};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS feed_snapshot (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    posts TEXT NOT NULL,
    post_count INTEGER NOT NULL,
    fetched_at TEXT NOT NULL
)
"#;

#[derive(Debug, Clone)]
pub struct FeedStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    posts: String,
    post_count: i64,
    fetched_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MetaRow {
    post_count: i64,
    fetched_at: DateTime<Utc>,
}

impl FeedStore {
    /// Open (or create) the store at `database_url` and ensure the schema
    /// exists. Safe to call against a path that has never been written.
    pub async fn open(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Full replace: the new snapshot entirely supersedes any prior one in a
    /// single statement, so concurrent writers are last-write-wins and a
    /// reader can never observe a mix of old and new posts.
    pub async fn write(&self, posts: &[Post]) -> Result<()> {
        let payload = serde_json::to_string(posts)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO feed_snapshot (id, posts, post_count, fetched_at)
            VALUES (1, ?1, ?2, ?3)
            "#,
        )
        .bind(payload)
        .bind(posts.len() as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Current snapshot, or `None` on a cache miss. Never-written, cleared,
    /// unreadable, and corrupt all look identical to the caller.
    pub async fn read(&self) -> Option<CacheSnapshot> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT posts, post_count, fetched_at FROM feed_snapshot WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await;

        let row = match row {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read feed snapshot, treating as cache miss");
                return None;
            }
        };

        match serde_json::from_str::<Vec<Post>>(&row.posts) {
            Ok(posts) => Some(CacheSnapshot {
                posts,
                fetched_at: row.fetched_at,
                count: row.post_count as usize,
            }),
            Err(e) => {
                warn!(error = %e, "Corrupt feed snapshot payload, treating as cache miss");
                None
            }
        }
    }

    /// Empty the store. Subsequent reads return `None` until the next write.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM feed_snapshot")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Snapshot metadata without materializing the post list.
    pub async fn stats(&self) -> Option<SnapshotMeta> {
        let row = sqlx::query_as::<_, MetaRow>(
            "SELECT post_count, fetched_at FROM feed_snapshot WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some(row)) => Some(SnapshotMeta {
                count: row.post_count as usize,
                fetched_at: row.fetched_at,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read feed snapshot stats");
                None
            }
        }
    }
}
