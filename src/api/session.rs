use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ImportError, Result};
use crate::models::Config;

/// Body of a successful GET, and whether it came from the response cache
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub url: String,
    pub body: Vec<u8>,
    pub from_cache: bool,
}

impl FetchedResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// SQLite-backed store of successful responses.
///
/// Cache-control headers are ignored; an entry is served until it is older
/// than the configured number of days.
#[derive(Clone)]
pub struct ResponseCache {
    pool: SqlitePool,
    path: PathBuf,
    expire_after: ChronoDuration,
}

impl ResponseCache {
    pub async fn open(path: &Path, expire_days: i64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS http_cache (
                url TEXT PRIMARY KEY NOT NULL,
                status INTEGER NOT NULL,
                body BLOB NOT NULL,
                fetched_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            path: path.to_path_buf(),
            expire_after: ChronoDuration::days(expire_days),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A stored body that has not yet expired
    pub async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let cutoff = Utc::now() - self.expire_after;
        let body = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT body FROM http_cache WHERE url = ? AND fetched_at > ?",
        )
        .bind(url)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;
        Ok(body)
    }

    pub async fn put(&self, url: &str, status: u16, body: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO http_cache (url, status, body, fetched_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                status = excluded.status,
                body = excluded.body,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(url)
        .bind(status as i64)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove expired entries, returning how many were dropped
    pub async fn purge_expired(&self) -> Result<u64> {
        let cutoff = Utc::now() - self.expire_after;
        let result = sqlx::query("DELETE FROM http_cache WHERE fetched_at <= ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// HTTP client used by the import commands, optionally backed by a response cache
pub struct HttpSession {
    client: Client,
    cache: Option<ResponseCache>,
}

impl HttpSession {
    /// Build a session; with `install_cache` responses are kept in
    /// `<cache_dir>/<cache_name>.sqlite`
    pub async fn new(config: &Config, cache_name: &str, install_cache: bool) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(config.user_agent.clone())
            .build()?;

        let cache = if install_cache {
            let path = config.cache_dir.join(format!("{}.sqlite", cache_name));
            let cache = ResponseCache::open(&path, config.cache_expire_days).await?;
            let purged = cache.purge_expired().await?;
            debug!(
                "Response cache at {} ({} expired entries removed)",
                cache.path().display(),
                purged
            );
            Some(cache)
        } else {
            None
        };

        Ok(Self { client, cache })
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// GET `url`; any non-2xx status is an error and is never cached
    pub async fn get(&self, url: &str) -> Result<FetchedResponse> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url).await? {
                return Ok(FetchedResponse {
                    url: url.to_string(),
                    body,
                    from_cache: true,
                });
            }
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?.to_vec();
        info!("📥 Downloaded {} bytes from {}", body.len(), url);

        if let Some(cache) = &self.cache {
            cache.put(url, status.as_u16(), &body).await?;
        }

        Ok(FetchedResponse {
            url: url.to_string(),
            body,
            from_cache: false,
        })
    }
}
