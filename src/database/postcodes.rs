use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::rows_per_statement;
use crate::error::Result;
use crate::models::GeoCode;

pub const GEOCODE_TABLE: &str = "geocode";

pub async fn upsert_geocodes(conn: &mut SqliteConnection, geocodes: &[GeoCode]) -> Result<u64> {
    let mut saved = 0;
    for chunk in geocodes.chunks(rows_per_statement(16)) {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            INSERT INTO geocode (
                geogcd, geognm, geognmw, si_id, si_title, oper_date, term_date,
                parentcd, entitycd, owner, status,
                areaehect, areachect, areaihect, arealhect, in_latest_update
            )
            "#,
        );
        query.push_values(chunk, |mut row, geocode| {
            row.push_bind(&geocode.geogcd)
                .push_bind(&geocode.geognm)
                .push_bind(&geocode.geognmw)
                .push_bind(&geocode.si_id)
                .push_bind(&geocode.si_title)
                .push_bind(geocode.oper_date)
                .push_bind(geocode.term_date)
                .push_bind(&geocode.parentcd)
                .push_bind(&geocode.entitycd)
                .push_bind(&geocode.owner)
                .push_bind(&geocode.status)
                .push_bind(geocode.areaehect)
                .push_bind(geocode.areachect)
                .push_bind(geocode.areaihect)
                .push_bind(geocode.arealhect)
                .push_bind(geocode.in_latest_update);
        });
        query.push(
            r#"
            ON CONFLICT(geogcd) DO UPDATE SET
                geognm = excluded.geognm,
                geognmw = excluded.geognmw,
                si_id = excluded.si_id,
                si_title = excluded.si_title,
                oper_date = excluded.oper_date,
                term_date = excluded.term_date,
                parentcd = excluded.parentcd,
                entitycd = excluded.entitycd,
                owner = excluded.owner,
                status = excluded.status,
                areaehect = excluded.areaehect,
                areachect = excluded.areachect,
                areaihect = excluded.areaihect,
                arealhect = excluded.arealhect,
                in_latest_update = excluded.in_latest_update
            "#,
        );
        saved += query.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(saved)
}

/// Look up a single geography code
pub async fn get_geocode(pool: &SqlitePool, geogcd: &str) -> Result<Option<GeoCode>> {
    let row = sqlx::query(
        r#"
        SELECT geogcd, geognm, geognmw, si_id, si_title, oper_date, term_date,
               parentcd, entitycd, owner, status,
               areaehect, areachect, areaihect, arealhect, in_latest_update
        FROM geocode
        WHERE geogcd = ?
        "#,
    )
    .bind(geogcd)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| GeoCode {
        geogcd: r.get("geogcd"),
        geognm: r.get("geognm"),
        geognmw: r.get("geognmw"),
        si_id: r.get("si_id"),
        si_title: r.get("si_title"),
        oper_date: r.get("oper_date"),
        term_date: r.get("term_date"),
        parentcd: r.get("parentcd"),
        entitycd: r.get("entitycd"),
        owner: r.get("owner"),
        status: r.get("status"),
        areaehect: r.get("areaehect"),
        areachect: r.get("areachect"),
        areaihect: r.get("areaihect"),
        arealhect: r.get("arealhect"),
        in_latest_update: r.get("in_latest_update"),
    }))
}

pub async fn count_by_status(pool: &SqlitePool, status: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM geocode WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
