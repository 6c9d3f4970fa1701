use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::rows_per_statement;
use crate::error::Result;
use crate::models::{CcewCharity, CharityAreaOfOperation};

pub const CHARITY_TABLE: &str = "ccew_charity";
pub const AREA_OF_OPERATION_TABLE: &str = "ccew_charity_area_of_operation";

pub async fn upsert_charities(conn: &mut SqliteConnection, charities: &[CcewCharity]) -> Result<u64> {
    let mut saved = 0;
    for chunk in charities.chunks(rows_per_statement(18)) {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            INSERT INTO ccew_charity (
                organisation_number, registered_charity_number, linked_charity_number,
                charity_name, charity_type, charity_registration_status,
                date_of_registration, date_of_removal, latest_income, latest_expenditure,
                charity_contact_postcode, charity_contact_web, charity_company_registration_number,
                charity_insolvent, charity_in_administration, charity_is_cio,
                date_of_extract, in_latest_update
            )
            "#,
        );
        query.push_values(chunk, |mut row, charity| {
            row.push_bind(charity.organisation_number)
                .push_bind(charity.registered_charity_number)
                .push_bind(charity.linked_charity_number)
                .push_bind(&charity.charity_name)
                .push_bind(&charity.charity_type)
                .push_bind(&charity.charity_registration_status)
                .push_bind(charity.date_of_registration)
                .push_bind(charity.date_of_removal)
                .push_bind(charity.latest_income)
                .push_bind(charity.latest_expenditure)
                .push_bind(&charity.charity_contact_postcode)
                .push_bind(&charity.charity_contact_web)
                .push_bind(&charity.charity_company_registration_number)
                .push_bind(charity.charity_insolvent)
                .push_bind(charity.charity_in_administration)
                .push_bind(charity.charity_is_cio)
                .push_bind(charity.date_of_extract)
                .push_bind(charity.in_latest_update);
        });
        query.push(
            r#"
            ON CONFLICT(organisation_number) DO UPDATE SET
                registered_charity_number = excluded.registered_charity_number,
                linked_charity_number = excluded.linked_charity_number,
                charity_name = excluded.charity_name,
                charity_type = excluded.charity_type,
                charity_registration_status = excluded.charity_registration_status,
                date_of_registration = excluded.date_of_registration,
                date_of_removal = excluded.date_of_removal,
                latest_income = excluded.latest_income,
                latest_expenditure = excluded.latest_expenditure,
                charity_contact_postcode = excluded.charity_contact_postcode,
                charity_contact_web = excluded.charity_contact_web,
                charity_company_registration_number = excluded.charity_company_registration_number,
                charity_insolvent = excluded.charity_insolvent,
                charity_in_administration = excluded.charity_in_administration,
                charity_is_cio = excluded.charity_is_cio,
                date_of_extract = excluded.date_of_extract,
                in_latest_update = excluded.in_latest_update
            "#,
        );
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}

pub async fn upsert_areas_of_operation(
    conn: &mut SqliteConnection,
    areas: &[CharityAreaOfOperation],
) -> Result<u64> {
    let mut saved = 0;
    for chunk in areas.chunks(rows_per_statement(10)) {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            INSERT INTO ccew_charity_area_of_operation (
                organisation_number, registered_charity_number, linked_charity_number,
                geographic_area_type, geographic_area_description,
                parent_geographic_area_type, parent_geographic_area_description,
                welsh_ind, date_of_extract, in_latest_update
            )
            "#,
        );
        query.push_values(chunk, |mut row, area| {
            row.push_bind(area.organisation_number)
                .push_bind(area.registered_charity_number)
                .push_bind(area.linked_charity_number)
                .push_bind(&area.geographic_area_type)
                .push_bind(&area.geographic_area_description)
                .push_bind(&area.parent_geographic_area_type)
                .push_bind(&area.parent_geographic_area_description)
                .push_bind(area.welsh_ind)
                .push_bind(area.date_of_extract)
                .push_bind(area.in_latest_update);
        });
        query.push(
            r#"
            ON CONFLICT(organisation_number, geographic_area_type, geographic_area_description) DO UPDATE SET
                registered_charity_number = excluded.registered_charity_number,
                linked_charity_number = excluded.linked_charity_number,
                parent_geographic_area_type = excluded.parent_geographic_area_type,
                parent_geographic_area_description = excluded.parent_geographic_area_description,
                welsh_ind = excluded.welsh_ind,
                date_of_extract = excluded.date_of_extract,
                in_latest_update = excluded.in_latest_update
            "#,
        );
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}
