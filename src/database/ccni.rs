use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::rows_per_statement;
use crate::error::Result;
use crate::models::{CcniCharity, CharityClassification};

pub const CHARITY_TABLE: &str = "ccni_charity";
pub const CLASSIFICATION_TABLE: &str = "ccni_charity_classification";

pub async fn upsert_charities(conn: &mut SqliteConnection, charities: &[CcniCharity]) -> Result<u64> {
    let mut saved = 0;
    for chunk in charities.chunks(rows_per_statement(17)) {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            INSERT INTO ccni_charity (
                reg_charity_number, sub_charity_number, charity_name, date_registered, status,
                date_for_financial_year_ending, total_income, total_spending, charitable_spending,
                income_generation_and_governance, retained_for_future_use,
                public_address, website, email, telephone, company_number, in_latest_update
            )
            "#,
        );
        query.push_values(chunk, |mut row, charity| {
            row.push_bind(charity.reg_charity_number)
                .push_bind(charity.sub_charity_number)
                .push_bind(&charity.charity_name)
                .push_bind(charity.date_registered)
                .push_bind(&charity.status)
                .push_bind(charity.date_for_financial_year_ending)
                .push_bind(charity.total_income)
                .push_bind(charity.total_spending)
                .push_bind(charity.charitable_spending)
                .push_bind(charity.income_generation_and_governance)
                .push_bind(charity.retained_for_future_use)
                .push_bind(&charity.public_address)
                .push_bind(&charity.website)
                .push_bind(&charity.email)
                .push_bind(&charity.telephone)
                .push_bind(&charity.company_number)
                .push_bind(charity.in_latest_update);
        });
        query.push(
            r#"
            ON CONFLICT(reg_charity_number) DO UPDATE SET
                sub_charity_number = excluded.sub_charity_number,
                charity_name = excluded.charity_name,
                date_registered = excluded.date_registered,
                status = excluded.status,
                date_for_financial_year_ending = excluded.date_for_financial_year_ending,
                total_income = excluded.total_income,
                total_spending = excluded.total_spending,
                charitable_spending = excluded.charitable_spending,
                income_generation_and_governance = excluded.income_generation_and_governance,
                retained_for_future_use = excluded.retained_for_future_use,
                public_address = excluded.public_address,
                website = excluded.website,
                email = excluded.email,
                telephone = excluded.telephone,
                company_number = excluded.company_number,
                in_latest_update = excluded.in_latest_update
            "#,
        );
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}

pub async fn upsert_classifications(
    conn: &mut SqliteConnection,
    classifications: &[CharityClassification],
) -> Result<u64> {
    let mut saved = 0;
    for chunk in classifications.chunks(rows_per_statement(4)) {
        let mut query = QueryBuilder::<Sqlite>::new(
            "INSERT INTO ccni_charity_classification (charity_id, classification_type, classification, in_latest_update) ",
        );
        query.push_values(chunk, |mut row, classification| {
            row.push_bind(classification.charity_id)
                .push_bind(classification.classification_type.as_str())
                .push_bind(&classification.classification)
                .push_bind(classification.in_latest_update);
        });
        query.push(
            " ON CONFLICT(charity_id, classification_type, classification) DO UPDATE SET \
             in_latest_update = excluded.in_latest_update",
        );
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}
