//! Charity Commission for England & Wales extract import

use pretty_assertions::assert_eq;
use wiremock::MockServer;

use charity_data::tools::{find_command, ImportOptions, ImportSummary};

use crate::common::api_mock::{mount_bytes, mount_status};
use crate::common::fixtures::{ccew_area_row, ccew_area_zip, ccew_charity_row, ccew_charity_zip};
use crate::common::{init_fresh_test_database, TestDatabase};

const CHARITY_ROUTE: &str = "/ccew/publicextract.charity.zip";
const AREA_ROUTE: &str = "/ccew/publicextract.charity_area_of_operation.zip";

async fn run(test_db: &TestDatabase) -> charity_data::Result<ImportSummary> {
    find_command(&test_db.config, "import-ccew")?
        .handle(&test_db.db, ImportOptions::default())
        .await
}

async fn mount_extract(server: &MockServer) {
    mount_bytes(
        server,
        CHARITY_ROUTE,
        ccew_charity_zip(&[
            ccew_charity_row(200001, "Cardiff Community Trust", "Registered"),
            ccew_charity_row(200002, "Leeds Lending Library", "Removed"),
        ]),
    )
    .await;
    mount_bytes(
        server,
        AREA_ROUTE,
        ccew_area_zip(&[
            ccew_area_row(200001, "Local Authority", "Cardiff", true),
            ccew_area_row(200001, "Local Authority", "Newport", true),
            ccew_area_row(200002, "Local Authority", "Leeds City", false),
        ]),
    )
    .await;
}

#[test_log::test(tokio::test)]
async fn test_import_both_extract_files() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_extract(&server).await;

    let summary = run(&test_db).await.unwrap();

    assert_eq!(summary.files_fetched, 2);
    assert_eq!(summary.saved_for("Charity"), 2);
    assert_eq!(summary.saved_for("CharityAreaOfOperation"), 3);
    assert_eq!(test_db.count("ccew_charity").await, 2);
    assert_eq!(test_db.count("ccew_charity_area_of_operation").await, 3);
    assert_eq!(
        test_db
            .count_where(
                "ccew_charity",
                "organisation_number = 200001 AND registered_charity_number = 1200001 \
                 AND charity_is_cio = 1 AND charity_insolvent = 0 AND date_of_registration = '1990-03-01'",
            )
            .await,
        1
    );
    assert_eq!(test_db.count_where("ccew_charity_area_of_operation", "welsh_ind = 1").await, 2);
}

#[test_log::test(tokio::test)]
async fn test_missing_area_file_leaves_areas_unpruned() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_extract(&server).await;
    run(&test_db).await.unwrap();

    server.reset().await;
    mount_bytes(
        &server,
        CHARITY_ROUTE,
        ccew_charity_zip(&[ccew_charity_row(200001, "Cardiff Community Trust", "Registered")]),
    )
    .await;
    mount_status(&server, AREA_ROUTE, 404).await;
    let summary = run(&test_db).await.unwrap();

    assert_eq!(summary.files_fetched, 1);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.deleted_for("Charity"), 1);
    assert_eq!(summary.deleted_for("CharityAreaOfOperation"), 0);
    assert_eq!(test_db.count("ccew_charity").await, 1);
    assert_eq!(test_db.count("ccew_charity_area_of_operation").await, 3);
}
