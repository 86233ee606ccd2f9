//! Result Spool: a persistent integer-keyed store bridging Workers and the
//! Coordinator. Workers `save` batches as they fill them; the Coordinator
//! `restore`s and `remove`s them in ascending key order once a block cycle
//! finishes. Key `999999` is reserved for the cached Dictionary.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Well-known key under which the resolved dictionary and its hash are
/// persisted across job invocations.
pub const DICTIONARY_KEY: i64 = 999_999;

#[derive(Clone)]
pub struct Spool {
    pool: SqlitePool,
}

impl Spool {
    pub async fn open(path: &Path) -> Result<Self> {
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .with_context(|| format!("failed to open spool database at {}", path.display()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS spool (
                idx INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .context("failed to initialize spool schema")?;

        Ok(Self { pool })
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn save<T: Serialize>(&self, idx: i64, data: &T) -> Result<()> {
        let payload = serde_json::to_string(data).context("failed to serialize spool entry")?;
        sqlx::query("INSERT OR REPLACE INTO spool (idx, payload) VALUES (?, ?)")
            .bind(idx)
            .bind(payload)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to save spool entry {idx}"))?;
        Ok(())
    }

    pub async fn restore<T: DeserializeOwned>(&self, idx: i64) -> Result<Option<T>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM spool WHERE idx = ?")
            .bind(idx)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to restore spool entry {idx}"))?;
        match row {
            Some((payload,)) => Ok(Some(
                serde_json::from_str(&payload).context("failed to deserialize spool entry")?,
            )),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, idx: i64) -> Result<()> {
        sqlx::query("DELETE FROM spool WHERE idx = ?")
            .bind(idx)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove spool entry {idx}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        value: String,
    }

    async fn open_tmp() -> (Spool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spool.sqlite");
        let spool = Spool::open(&path).await.unwrap();
        (spool, dir)
    }

    #[tokio::test]
    async fn save_then_restore_round_trips() {
        let (spool, _dir) = open_tmp().await;
        let payload = Payload {
            value: "hello".to_string(),
        };
        spool.save(1, &payload).await.unwrap();
        let restored: Option<Payload> = spool.restore(1).await.unwrap();
        assert_eq!(restored, Some(payload));
    }

    #[tokio::test]
    async fn restore_missing_key_is_none() {
        let (spool, _dir) = open_tmp().await;
        let restored: Option<Payload> = spool.restore(42).await.unwrap();
        assert_eq!(restored, None);
    }

    #[tokio::test]
    async fn remove_deletes_entry() {
        let (spool, _dir) = open_tmp().await;
        let payload = Payload {
            value: "x".to_string(),
        };
        spool.save(1, &payload).await.unwrap();
        spool.remove(1).await.unwrap();
        let restored: Option<Payload> = spool.restore(1).await.unwrap();
        assert_eq!(restored, None);
    }
}
