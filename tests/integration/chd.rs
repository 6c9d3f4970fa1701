//! Code History Database import

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use wiremock::MockServer;

use charity_data::database::postcodes::{count_by_status, get_geocode};
use charity_data::tools::{find_command, ImportOptions, ImportSummary};
use charity_data::ImportError;

use crate::common::api_mock::mount_bytes;
use crate::common::fixtures::{build_zip, chd_zip};
use crate::common::{init_fresh_test_database, TestDatabase};

async fn run(test_db: &TestDatabase, options: ImportOptions) -> charity_data::Result<ImportSummary> {
    find_command(&test_db.config, "import-chd")?
        .handle(&test_db.db, options)
        .await
}

async fn geography_name(test_db: &TestDatabase, code: &str) -> Option<String> {
    get_geocode(test_db.db.pool(), code)
        .await
        .unwrap()
        .expect("geocode imported")
        .geognm
}

#[test_log::test(tokio::test)]
async fn test_import_change_history() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_bytes(&server, "/chd.zip", chd_zip()).await;

    let summary = run(&test_db, ImportOptions::default()).await.unwrap();

    assert_eq!(summary.saved_for("GeoCode"), 500);
    assert_eq!(test_db.count("geocode").await, 500);
    assert_eq!(count_by_status(test_db.db.pool(), "live").await.unwrap(), 417);
    assert_eq!(
        geography_name(&test_db, "E04005721").await.as_deref(),
        Some("Skidbrooke with Saltfleet Haven")
    );
    assert_eq!(geography_name(&test_db, "E33003018").await, None);
    assert_eq!(
        test_db
            .count_where("geocode", "geogcd = 'E04005721' AND oper_date = '1974-04-01'")
            .await,
        1
    );
}

#[test_log::test(tokio::test)]
async fn test_debug_import_prunes_unseen_codes() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_bytes(&server, "/chd.zip", chd_zip()).await;
    run(&test_db, ImportOptions::default()).await.unwrap();

    let summary = run(&test_db, ImportOptions { cache: false, debug: true }).await.unwrap();

    assert_eq!(summary.saved_for("GeoCode"), 101);
    assert_eq!(summary.deleted_for("GeoCode"), 399);
    assert_eq!(test_db.count("geocode").await, 101);
}

#[test_log::test(tokio::test)]
async fn test_archive_without_change_history_is_an_error() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_bytes(&server, "/chd.zip", build_zip(&[("Changes.csv", "GEOGCD\n")])).await;

    let result = run(&test_db, ImportOptions::default()).await;

    assert_matches!(result, Err(ImportError::MissingMember { member, .. }) if member == "ChangeHistory.csv");
    assert_eq!(test_db.count("geocode").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_unset_chd_url_is_an_error_before_fetching() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_bytes(&server, "/chd.zip", chd_zip()).await;
    let config = charity_data::models::Config {
        chd_url: None,
        ..test_db.config.clone()
    };

    let result = find_command(&config, "import-chd")
        .unwrap()
        .handle(&test_db.db, ImportOptions::default())
        .await;

    assert_matches!(result, Err(ImportError::MissingSetting("CHD_URL")));
    assert_eq!(test_db.count("geocode").await, 0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
