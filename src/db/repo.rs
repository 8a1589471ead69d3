use super::model::AnnouncementEntry;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, instrument};

pub type Pool = SqlitePool;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url)?;
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database URL: {}", database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open announcement store at {}", normalized))?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory and non-sqlite URLs untouched.
fn prepare_sqlite_url(url: &str) -> Result<String> {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return Ok(url.to_string());
    };
    if rest.starts_with(":memory") {
        return Ok(url.to_string());
    }

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_part.is_empty() {
        return Ok(url.to_string());
    }

    let expanded = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut rebuilt = format!("sqlite://{}", expanded);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    Ok(rebuilt)
}

/// Create the schema. Safe to run against a store that already has it.
pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Current time in the format stored alongside each announcement.
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Durable record of which announcement keys have been posted.
///
/// Uniqueness of keys is not enforced here; the pipeline checks
/// [`has_been_announced`](Self::has_been_announced) before posting.
#[derive(Debug, Clone)]
pub struct AnnouncementStore {
    pool: Pool,
}

impl AnnouncementStore {
    /// Open (creating if needed) the store at `database_url` and apply migrations.
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = init_pool(database_url).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool) -> Result<Self> {
        run_migrations(&pool)
            .await
            .context("failed to initialize announcement store")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn has_been_announced(&self, key: &str) -> Result<bool> {
        Ok(self.count_for(key).await? > 0)
    }

    #[instrument(skip(self))]
    pub async fn record_announcement(&self, key: &str, timestamp: &str) -> Result<()> {
        sqlx::query("INSERT INTO announcements (key, announced_at) VALUES (?, ?)")
            .bind(key)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;
        debug!("announcement recorded");
        Ok(())
    }

    pub async fn count_for(&self, key: &str) -> Result<i64> {
        let cnt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM announcements WHERE key = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(cnt)
    }

    /// All rows in insertion order.
    pub async fn entries(&self) -> Result<Vec<AnnouncementEntry>> {
        let rows = sqlx::query_as::<_, AnnouncementEntry>(
            "SELECT key, announced_at FROM announcements ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> AnnouncementStore {
        AnnouncementStore::open("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn lookup_before_and_after_record() {
        let store = memory_store().await;
        let key = "https://github.com/foo/bar/contribute";
        assert!(!store.has_been_announced(key).await.unwrap());
        store.record_announcement(key, "2024-01-01 00:00:00").await.unwrap();
        assert!(store.has_been_announced(key).await.unwrap());
        let other = "https://github.com/foo/baz/contribute";
        assert!(!store.has_been_announced(other).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_inserts_are_kept() {
        let store = memory_store().await;
        store.record_announcement("k", "2024-01-01 00:00:00").await.unwrap();
        store.record_announcement("k", "2024-01-02 00:00:00").await.unwrap();
        assert_eq!(store.count_for("k").await.unwrap(), 2);
        assert!(store.has_been_announced("k").await.unwrap());

        let entries = store.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, "2024-01-01 00:00:00");
        assert_eq!(entries[1].timestamp, "2024-01-02 00:00:00");
    }

    #[tokio::test]
    async fn migrations_are_idempotent_on_same_pool() {
        let store = memory_store().await;
        store.record_announcement("k", "t").await.unwrap();
        run_migrations(store.pool()).await.unwrap();
        assert_eq!(store.count_for("k").await.unwrap(), 1);
    }

    #[test]
    fn timestamp_format() {
        let ts = now_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn memory_and_foreign_urls_untouched() {
        for url in ["sqlite::memory:", "postgres://x/y"] {
            assert_eq!(prepare_sqlite_url(url).unwrap(), url);
        }
    }

    #[test]
    fn file_url_creates_parent_and_keeps_query() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("nested").join("store.db");
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let out = prepare_sqlite_url(&url).unwrap();
        assert_eq!(out, format!("sqlite://{}?mode=rwc", path.display()));
        assert!(td.path().join("nested").is_dir());
    }
}
