use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::rows_per_statement;
use crate::error::Result;
use crate::models::{Company, CompanySicCode, PreviousName, SicCode};

pub const COMPANY_TABLE: &str = "company";
pub const PREVIOUS_NAME_TABLE: &str = "company_previous_name";
pub const SIC_CODE_TABLE: &str = "sic_code";
pub const COMPANY_SIC_CODE_TABLE: &str = "company_sic_code";

/// Insert or update SIC codes; an existing title is kept when the new one is missing
pub async fn upsert_sic_codes(conn: &mut SqliteConnection, codes: &[SicCode]) -> Result<u64> {
    let mut saved = 0;
    for chunk in codes.chunks(rows_per_statement(2)) {
        let mut query = QueryBuilder::<Sqlite>::new("INSERT INTO sic_code (code, title) ");
        query.push_values(chunk, |mut row, code| {
            row.push_bind(&code.code).push_bind(&code.title);
        });
        query.push(" ON CONFLICT(code) DO UPDATE SET title = COALESCE(excluded.title, sic_code.title)");
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}

/// Insert or update companies, overwriting every column but the company number
pub async fn upsert_companies(conn: &mut SqliteConnection, companies: &[Company]) -> Result<u64> {
    let mut saved = 0;
    for chunk in companies.chunks(rows_per_statement(33)) {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            INSERT INTO company (
                company_number, company_name,
                reg_address_care_of, reg_address_po_box, reg_address_address_line1,
                reg_address_address_line2, reg_address_post_town, reg_address_county,
                reg_address_country, reg_address_post_code,
                company_category, company_status, country_of_origin,
                dissolution_date, incorporation_date,
                accounts_account_ref_day, accounts_account_ref_month,
                accounts_next_due_date, accounts_last_made_up_date, accounts_account_category,
                returns_next_due_date, returns_last_made_up_date,
                mortgages_num_mort_charges, mortgages_num_mort_outstanding,
                mortgages_num_mort_part_satisfied, mortgages_num_mort_satisfied,
                limited_partnerships_num_gen_partners, limited_partnerships_num_lim_partners,
                uri, conf_stmt_next_due_date, conf_stmt_last_made_up_date,
                last_updated, in_latest_update
            )
            "#,
        );
        query.push_values(chunk, |mut row, company| {
            row.push_bind(&company.company_number)
                .push_bind(&company.company_name)
                .push_bind(&company.reg_address_care_of)
                .push_bind(&company.reg_address_po_box)
                .push_bind(&company.reg_address_address_line1)
                .push_bind(&company.reg_address_address_line2)
                .push_bind(&company.reg_address_post_town)
                .push_bind(&company.reg_address_county)
                .push_bind(&company.reg_address_country)
                .push_bind(&company.reg_address_post_code)
                .push_bind(&company.company_category)
                .push_bind(&company.company_status)
                .push_bind(&company.country_of_origin)
                .push_bind(company.dissolution_date)
                .push_bind(company.incorporation_date)
                .push_bind(company.accounts_account_ref_day)
                .push_bind(company.accounts_account_ref_month)
                .push_bind(company.accounts_next_due_date)
                .push_bind(company.accounts_last_made_up_date)
                .push_bind(&company.accounts_account_category)
                .push_bind(company.returns_next_due_date)
                .push_bind(company.returns_last_made_up_date)
                .push_bind(company.mortgages_num_mort_charges)
                .push_bind(company.mortgages_num_mort_outstanding)
                .push_bind(company.mortgages_num_mort_part_satisfied)
                .push_bind(company.mortgages_num_mort_satisfied)
                .push_bind(company.limited_partnerships_num_gen_partners)
                .push_bind(company.limited_partnerships_num_lim_partners)
                .push_bind(&company.uri)
                .push_bind(company.conf_stmt_next_due_date)
                .push_bind(company.conf_stmt_last_made_up_date)
                .push_bind(company.last_updated)
                .push_bind(company.in_latest_update);
        });
        query.push(
            r#"
            ON CONFLICT(company_number) DO UPDATE SET
                company_name = excluded.company_name,
                reg_address_care_of = excluded.reg_address_care_of,
                reg_address_po_box = excluded.reg_address_po_box,
                reg_address_address_line1 = excluded.reg_address_address_line1,
                reg_address_address_line2 = excluded.reg_address_address_line2,
                reg_address_post_town = excluded.reg_address_post_town,
                reg_address_county = excluded.reg_address_county,
                reg_address_country = excluded.reg_address_country,
                reg_address_post_code = excluded.reg_address_post_code,
                company_category = excluded.company_category,
                company_status = excluded.company_status,
                country_of_origin = excluded.country_of_origin,
                dissolution_date = excluded.dissolution_date,
                incorporation_date = excluded.incorporation_date,
                accounts_account_ref_day = excluded.accounts_account_ref_day,
                accounts_account_ref_month = excluded.accounts_account_ref_month,
                accounts_next_due_date = excluded.accounts_next_due_date,
                accounts_last_made_up_date = excluded.accounts_last_made_up_date,
                accounts_account_category = excluded.accounts_account_category,
                returns_next_due_date = excluded.returns_next_due_date,
                returns_last_made_up_date = excluded.returns_last_made_up_date,
                mortgages_num_mort_charges = excluded.mortgages_num_mort_charges,
                mortgages_num_mort_outstanding = excluded.mortgages_num_mort_outstanding,
                mortgages_num_mort_part_satisfied = excluded.mortgages_num_mort_part_satisfied,
                mortgages_num_mort_satisfied = excluded.mortgages_num_mort_satisfied,
                limited_partnerships_num_gen_partners = excluded.limited_partnerships_num_gen_partners,
                limited_partnerships_num_lim_partners = excluded.limited_partnerships_num_lim_partners,
                uri = excluded.uri,
                conf_stmt_next_due_date = excluded.conf_stmt_next_due_date,
                conf_stmt_last_made_up_date = excluded.conf_stmt_last_made_up_date,
                last_updated = excluded.last_updated,
                in_latest_update = excluded.in_latest_update
            "#,
        );
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}

/// Insert previous names; an existing name only has its latest-update flag refreshed
pub async fn upsert_previous_names(conn: &mut SqliteConnection, names: &[PreviousName]) -> Result<u64> {
    let mut saved = 0;
    for chunk in names.chunks(rows_per_statement(4)) {
        let mut query = QueryBuilder::<Sqlite>::new(
            "INSERT INTO company_previous_name (company_number, company_name, con_date, in_latest_update) ",
        );
        query.push_values(chunk, |mut row, name| {
            row.push_bind(&name.company_number)
                .push_bind(&name.company_name)
                .push_bind(name.con_date)
                .push_bind(name.in_latest_update);
        });
        query.push(
            " ON CONFLICT(company_number, company_name) DO UPDATE SET in_latest_update = excluded.in_latest_update",
        );
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}

/// Link companies to SIC codes; an existing link only has its latest-update flag refreshed
pub async fn upsert_company_sic_codes(conn: &mut SqliteConnection, links: &[CompanySicCode]) -> Result<u64> {
    let mut saved = 0;
    for chunk in links.chunks(rows_per_statement(3)) {
        let mut query =
            QueryBuilder::<Sqlite>::new("INSERT INTO company_sic_code (company_number, sic_code, in_latest_update) ");
        query.push_values(chunk, |mut row, link| {
            row.push_bind(&link.company_number)
                .push_bind(&link.sic_code)
                .push_bind(link.in_latest_update);
        });
        query.push(" ON CONFLICT(company_number, sic_code) DO UPDATE SET in_latest_update = excluded.in_latest_update");
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}

/// Post-processing statements run after every companies import, in order
pub const UPDATE_COMPANIES: &[(&str, &str)] = &[
    (
        "Tidy registered office postcodes",
        r#"
        UPDATE company
        SET reg_address_post_code = UPPER(TRIM(reg_address_post_code))
        WHERE reg_address_post_code IS NOT NULL
          AND reg_address_post_code != UPPER(TRIM(reg_address_post_code))
        "#,
    ),
    (
        "Drop SIC codes no longer used by any company",
        r#"
        DELETE FROM sic_code
        WHERE NOT EXISTS (
            SELECT 1 FROM company_sic_code WHERE company_sic_code.sic_code = sic_code.code
        )
        "#,
    ),
];

/// Run the post-processing statements, returning the titles executed
pub async fn run_post_processing(conn: &mut SqliteConnection) -> Result<Vec<&'static str>> {
    let mut executed = Vec::new();
    for (title, sql) in UPDATE_COMPANIES {
        sqlx::query(sql).execute(&mut *conn).await?;
        executed.push(*title);
    }
    Ok(executed)
}
