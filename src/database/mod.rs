use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;

pub mod ccew;
pub mod ccni;
pub mod command_log;
pub mod companies;
pub mod postcodes;

/// SQLx-backed database manager for the import commands
#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Open (creating if missing) the database at `database_path` and run migrations
    pub async fn new(database_path: &str) -> Result<Self> {
        let path = database_path.strip_prefix("sqlite:").unwrap_or(database_path);
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let db = DatabaseManager { pool };
        db.run_migrations().await?;
        info!("💾 Database ready at {}", path);

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./db/migrations").run(&self.pool).await?;
        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start the single transaction an import command runs inside
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn count(&self, table: &'static str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// SQLite's limit on bound parameters in one statement
const MAX_BIND_PARAMS: usize = 32_766;

/// Rows per multi-row `INSERT` for a table with `columns` bound columns
pub(crate) fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Clear the `in_latest_update` flag on every row of `table`
pub async fn reset_latest_update(conn: &mut SqliteConnection, table: &'static str) -> Result<u64> {
    let result = sqlx::query(&format!("UPDATE {} SET in_latest_update = 0", table))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Rows kept and removed by a stale-record cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub kept: i64,
    pub deleted: u64,
}

/// Delete rows of `table` that were not seen in the latest import
pub async fn prune_stale(conn: &mut SqliteConnection, table: &'static str) -> Result<PruneResult> {
    let kept = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE in_latest_update = 1",
        table
    ))
    .fetch_one(&mut *conn)
    .await?;

    let to_delete = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE in_latest_update = 0",
        table
    ))
    .fetch_one(&mut *conn)
    .await?;
    info!("To keep: {}", kept);
    info!("To delete: {}", to_delete);

    let result = sqlx::query(&format!("DELETE FROM {} WHERE in_latest_update = 0", table))
        .execute(&mut *conn)
        .await?;

    Ok(PruneResult {
        kept,
        deleted: result.rows_affected(),
    })
}
