//! Companies House import against a mock index page

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use wiremock::MockServer;

use charity_data::tools::{find_command, ImportOptions};
use charity_data::ImportError;

use crate::common::api_mock::{index_page, mount_bytes, mount_html, mount_status};
use crate::common::fixtures::{build_zip, companies_csv, numbered_companies, TestCompany};
use crate::common::logging::log_test_step;
use crate::common::{init_fresh_test_database, TestDatabase};

const PART_1: &str = "/BasicCompanyData-2024-01-01-part1_2.zip";
const PART_2: &str = "/BasicCompanyData-2024-01-01-part2_2.zip";

fn company_zip(member: &str, companies: &[TestCompany]) -> Vec<u8> {
    build_zip(&[(member, companies_csv(companies))])
}

async fn mount_snapshot(server: &MockServer, parts: &[(&str, Vec<TestCompany>)]) {
    let links: Vec<&str> = parts.iter().map(|(route, _)| *route).collect();
    mount_html(server, "/en_output.html", index_page(&links)).await;
    for (route, companies) in parts {
        let member = route.trim_start_matches('/').replace(".zip", ".csv");
        mount_bytes(server, route, company_zip(&member, companies)).await;
    }
}

fn first_snapshot() -> Vec<TestCompany> {
    vec![
        TestCompany::new("00000001", "ALPHA LTD")
            .with_sic("62020 - Information technology consultancy activities")
            .with_previous_name("01/02/2015", "OLD ALPHA LTD"),
        TestCompany::new("00000002", "BETA LTD")
            .with_sic("62020 - Information technology consultancy activities")
            .with_sic("99999 - Dormant Company"),
        TestCompany::new("00000003", "GAMMA LTD"),
    ]
}

async fn run(test_db: &TestDatabase, options: ImportOptions) -> charity_data::Result<charity_data::tools::ImportSummary> {
    let command = find_command(&test_db.config, "import_companies")?;
    command.handle(&test_db.db, options).await
}

async fn company_status(test_db: &TestDatabase, number: &str) -> Option<String> {
    sqlx::query_scalar("SELECT company_status FROM company WHERE company_number = ?")
        .bind(number)
        .fetch_one(test_db.db.pool())
        .await
        .unwrap()
}

#[test_log::test(tokio::test)]
async fn test_import_companies_from_every_linked_file() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_snapshot(&server, &[(PART_1, first_snapshot()), (PART_2, numbered_companies(10, 2))]).await;

    let summary = run(&test_db, ImportOptions::default()).await.unwrap();

    assert_eq!(summary.files_fetched, 2);
    assert_eq!(summary.files_failed, 0);
    assert_eq!(summary.saved_for("Company"), 5);
    assert_eq!(summary.statements_executed.len(), 2);

    assert_eq!(test_db.count("company").await, 5);
    assert_eq!(test_db.count("sic_code").await, 2);
    assert_eq!(test_db.count("company_sic_code").await, 3);
    assert_eq!(test_db.count("company_previous_name").await, 1);
    assert_eq!(test_db.count_where("company", "in_latest_update = 1").await, 5);
    assert_eq!(
        test_db
            .count_where("company", "company_category = 'ltd' AND company_status = 'active'")
            .await,
        5
    );

    let title: Option<String> = sqlx::query_scalar("SELECT title FROM sic_code WHERE code = '99999'")
        .fetch_one(test_db.db.pool())
        .await
        .unwrap();
    assert_eq!(title.as_deref(), Some("Dormant Company"));
}

#[test_log::test(tokio::test)]
async fn test_second_snapshot_removes_stale_records() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;

    log_test_step("First snapshot");
    mount_snapshot(&server, &[(PART_1, first_snapshot())]).await;
    run(&test_db, ImportOptions::default()).await.unwrap();
    assert_eq!(test_db.count("company_sic_code").await, 3);

    log_test_step("Second snapshot without GAMMA, old names or the dormant code");
    server.reset().await;
    mount_snapshot(
        &server,
        &[(
            PART_1,
            vec![
                TestCompany::new("00000001", "ALPHA LTD"),
                TestCompany::new("00000002", "BETA LTD")
                    .with_sic("62020 - Information technology consultancy activities"),
            ],
        )],
    )
    .await;
    let summary = run(&test_db, ImportOptions::default()).await.unwrap();

    assert_eq!(summary.deleted_for("PreviousName"), 1);
    assert_eq!(summary.deleted_for("CompanySICCode"), 2);

    // Companies stay, only flagged as missing from the latest snapshot
    assert_eq!(test_db.count("company").await, 3);
    assert_eq!(company_status(&test_db, "00000003").await.as_deref(), Some("active"));
    assert_eq!(
        test_db
            .count_where("company", "company_number = '00000003' AND in_latest_update = 0")
            .await,
        1
    );
    assert_eq!(company_status(&test_db, "00000001").await.as_deref(), Some("active"));
    assert_eq!(test_db.count("company_previous_name").await, 0);
    assert_eq!(test_db.count("company_sic_code").await, 1);
    assert_eq!(test_db.count("sic_code").await, 1);
}

#[test_log::test(tokio::test)]
async fn test_failing_data_file_is_skipped() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_html(&server, "/en_output.html", index_page(&[PART_1, PART_2])).await;
    mount_bytes(&server, PART_1, company_zip("part1.csv", &first_snapshot())).await;
    mount_status(&server, PART_2, 404).await;

    let summary = run(&test_db, ImportOptions::default()).await.unwrap();

    assert_eq!(summary.files_fetched, 1);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(test_db.count("company").await, 3);
}

#[test_log::test(tokio::test)]
async fn test_skipped_file_keeps_company_status() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_snapshot(&server, &[(PART_1, first_snapshot()), (PART_2, numbered_companies(10, 2))]).await;
    run(&test_db, ImportOptions::default()).await.unwrap();

    server.reset().await;
    mount_html(&server, "/en_output.html", index_page(&[PART_1, PART_2])).await;
    mount_bytes(&server, PART_1, company_zip("part1.csv", &first_snapshot())).await;
    mount_status(&server, PART_2, 404).await;
    let summary = run(&test_db, ImportOptions::default()).await.unwrap();

    assert_eq!(summary.files_failed, 1);
    assert_eq!(test_db.count("company").await, 5);
    assert_eq!(company_status(&test_db, "00000010").await.as_deref(), Some("active"));
    assert_eq!(company_status(&test_db, "00000011").await.as_deref(), Some("active"));
    assert_eq!(test_db.count_where("company", "in_latest_update = 0").await, 2);
}

#[test_log::test(tokio::test)]
async fn test_debug_run_keeps_company_status_past_the_row_limit() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_snapshot(&server, &[(PART_1, numbered_companies(1, 150))]).await;
    run(&test_db, ImportOptions::default()).await.unwrap();

    let summary = run(&test_db, ImportOptions { cache: false, debug: true }).await.unwrap();

    assert_eq!(summary.saved_for("Company"), 101);
    assert_eq!(test_db.count("company").await, 150);
    assert_eq!(company_status(&test_db, "00000150").await.as_deref(), Some("active"));
    assert_eq!(test_db.count_where("company", "company_status = 'active'").await, 150);
}

#[test_log::test(tokio::test)]
async fn test_second_snapshot_updates_existing_records() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;

    log_test_step("First snapshot");
    mount_snapshot(&server, &[(PART_1, first_snapshot())]).await;
    run(&test_db, ImportOptions::default()).await.unwrap();

    log_test_step("Second snapshot with a new name, status, SIC title and change date");
    server.reset().await;
    let changed = TestCompany {
        status: "Liquidation".to_string(),
        ..TestCompany::new("00000001", "ALPHA HOLDINGS LTD")
            .with_sic("62020 - Computer consultancy")
            .with_previous_name("30/06/2019", "OLD ALPHA LTD")
    };
    mount_snapshot(&server, &[(PART_1, vec![changed])]).await;
    let summary = run(&test_db, ImportOptions::default()).await.unwrap();

    assert_eq!(summary.deleted_for("PreviousName"), 0);
    let (name, status): (Option<String>, Option<String>) =
        sqlx::query_as("SELECT company_name, company_status FROM company WHERE company_number = '00000001'")
            .fetch_one(test_db.db.pool())
            .await
            .unwrap();
    assert_eq!(name.as_deref(), Some("ALPHA HOLDINGS LTD"));
    assert_eq!(status.as_deref(), Some("liquidation"));

    let title: Option<String> = sqlx::query_scalar("SELECT title FROM sic_code WHERE code = '62020'")
        .fetch_one(test_db.db.pool())
        .await
        .unwrap();
    assert_eq!(title.as_deref(), Some("Computer consultancy"));

    // Previous names only refresh their flag on conflict
    assert_eq!(
        test_db
            .count_where(
                "company_previous_name",
                "company_name = 'OLD ALPHA LTD' AND con_date = '2015-02-01' AND in_latest_update = 1",
            )
            .await,
        1
    );
}

#[test_log::test(tokio::test)]
async fn test_index_without_data_files_rolls_back() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_snapshot(&server, &[(PART_1, first_snapshot())]).await;
    run(&test_db, ImportOptions::default()).await.unwrap();

    server.reset().await;
    mount_html(&server, "/en_output.html", index_page(&[])).await;
    let result = run(&test_db, ImportOptions::default()).await;

    assert_matches!(result, Err(ImportError::NoFiles(_)));
    // The flag reset happened inside the aborted transaction
    assert_eq!(test_db.count_where("company", "in_latest_update = 1").await, 3);
    assert_eq!(test_db.count("company_previous_name").await, 1);
}

#[test_log::test(tokio::test)]
async fn test_missing_index_page_is_an_error() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_status(&server, "/en_output.html", 503).await;

    let result = run(&test_db, ImportOptions::default()).await;

    assert_matches!(result, Err(ImportError::Status { status: 503, .. }));
    assert_eq!(test_db.count("company").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_debug_mode_stops_after_101_rows() {
    let server = MockServer::start().await;
    let test_db = init_fresh_test_database(&server.uri()).await;
    mount_snapshot(&server, &[(PART_1, numbered_companies(1, 250))]).await;

    let summary = run(&test_db, ImportOptions { cache: false, debug: true }).await.unwrap();

    assert_eq!(summary.saved_for("Company"), 101);
    assert_eq!(test_db.count("company").await, 101);
}

#[test_log::test(tokio::test)]
async fn test_small_bulk_limit_saves_in_batches() {
    let server = MockServer::start().await;
    let mut test_db = init_fresh_test_database(&server.uri()).await;
    test_db.config.bulk_limit = 7;
    mount_snapshot(&server, &[(PART_1, numbered_companies(1, 30))]).await;

    let summary = run(&test_db, ImportOptions::default()).await.unwrap();

    assert_eq!(summary.saved_for("Company"), 30);
    assert_eq!(test_db.count("company").await, 30);
}
