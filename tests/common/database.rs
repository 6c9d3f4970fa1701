//! Test database utilities using the real DatabaseManager

use charity_data::database::DatabaseManager;
use charity_data::models::Config;
use std::path::Path;
use tempfile::TempDir;

/// A migrated database in its own temporary directory, removed on drop
pub struct TestDatabase {
    pub db: DatabaseManager,
    pub config: Config,
    _dir: TempDir,
}

impl TestDatabase {
    pub async fn count(&self, table: &'static str) -> i64 {
        self.db.count(table).await.expect("count rows")
    }

    /// Count rows matching a WHERE clause
    pub async fn count_where(&self, table: &str, condition: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {} WHERE {}", table, condition))
            .fetch_one(self.db.pool())
            .await
            .expect("count rows")
    }
}

/// Configuration with every dataset URL served by `server_uri`
pub fn test_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        database_path: dir.join("test.db").to_string_lossy().to_string(),
        debug: false,
        cache_dir: dir.join("cache"),
        companies_start_url: format!("{}/en_output.html", server_uri),
        chd_url: Some(format!("{}/chd.zip", server_uri)),
        ccni_url: format!("{}/ccni.csv", server_uri),
        ccew_base_url: format!("{}/ccew/", server_uri),
        ..Config::default()
    }
}

/// Initialize a completely fresh test database pointed at `server_uri`
pub async fn init_fresh_test_database(server_uri: &str) -> TestDatabase {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = test_config(server_uri, dir.path());
    let db = DatabaseManager::new(&config.database_path)
        .await
        .expect("Failed to create test database");
    TestDatabase { db, config, _dir: dir }
}
