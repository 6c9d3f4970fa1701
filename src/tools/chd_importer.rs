use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::api::HttpSession;
use crate::database::postcodes::{upsert_geocodes, GEOCODE_TABLE};
use crate::database::{prune_stale, reset_latest_update, DatabaseManager};
use crate::error::{ImportError, Result};
use crate::models::{Config, DatasetSource, GeoCode, Publisher, OGL_V3_NAME, OGL_V3_URL};
use crate::tools::csv_source::{find_member, open_zip, CsvDialect, CsvRows};
use crate::tools::field_cleaner::FieldCleaner;
use crate::tools::import_command::{log_saved, log_saving, row_spinner, ImportCommand, ImportOptions, ImportSummary};
use crate::tools::record_batch::RecordBatch;

pub const CHD_CACHE_NAME: &str = "chd_download_cache";
pub const CHANGE_HISTORY_FILE: &str = "ChangeHistory.csv";

const GEOCODE_MODEL: &str = "GeoCode";
const DATE_FIELDS: [&str; 2] = ["OPER_DATE", "TERM_DATE"];
const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y", "%Y-%m-%d"];

pub fn geocode_cleaner() -> FieldCleaner {
    FieldCleaner::new()
        .with_date_fields(&DATE_FIELDS)
        .with_date_formats(&DATE_FORMATS)
}

/// Map one `ChangeHistory.csv` row; rows without a code yield `None`
pub fn parse_geocode(cleaner: &FieldCleaner, headers: &[String], values: &[String]) -> Option<GeoCode> {
    let record = cleaner.clean(headers, values);
    Some(GeoCode {
        geogcd: record.non_empty("GEOGCD")?,
        geognm: record.non_empty("GEOGNM"),
        geognmw: record.non_empty("GEOGNMW"),
        si_id: record.non_empty("SI_ID"),
        si_title: record.non_empty("SI_TITLE"),
        oper_date: record.date("OPER_DATE"),
        term_date: record.date("TERM_DATE"),
        parentcd: record.non_empty("PARENTCD"),
        entitycd: record.non_empty("ENTITYCD"),
        owner: record.non_empty("OWNER"),
        status: record.non_empty("STATUS"),
        areaehect: record.float("AREAEHECT"),
        areachect: record.float("AREACHECT"),
        areaihect: record.float("AREAIHECT"),
        arealhect: record.float("AREALHECT"),
        in_latest_update: true,
    })
}

/// `import-chd`: the ONS Code History Database
pub struct ChdImporter {
    config: Config,
}

impl ChdImporter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    async fn save(
        &self,
        conn: &mut SqliteConnection,
        batch: &mut RecordBatch<String, GeoCode>,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let records = batch.drain();
        log_saving(GEOCODE_MODEL, records.len());
        upsert_geocodes(&mut *conn, &records).await?;
        let total = summary.record_saved(GEOCODE_MODEL, records.len());
        log_saved(GEOCODE_MODEL, records.len(), total);
        Ok(())
    }
}

#[async_trait(?Send)]
impl ImportCommand for ChdImporter {
    fn name(&self) -> &'static str {
        "import-chd"
    }

    fn cache_name(&self) -> &'static str {
        CHD_CACHE_NAME
    }

    fn source(&self) -> DatasetSource {
        DatasetSource {
            title: "Code History Database (CHD)".to_string(),
            description: "The Code History Database contains the codes, names and change history of the \
                          statistical and administrative geographies of the United Kingdom."
                .to_string(),
            identifier: "chd".to_string(),
            license: OGL_V3_URL.to_string(),
            license_name: OGL_V3_NAME.to_string(),
            publisher: Publisher {
                name: "Office for National Statistics".to_string(),
                website: "https://geoportal.statistics.gov.uk/".to_string(),
            },
            distribution: self.config.chd_url.iter().cloned().collect(),
        }
    }

    async fn handle(&self, db: &DatabaseManager, options: ImportOptions) -> Result<ImportSummary> {
        let chd_url = self
            .config
            .chd_url
            .as_deref()
            .ok_or(ImportError::MissingSetting("CHD_URL"))?;
        let mut summary = ImportSummary::default();
        let mut tx = db.begin().await?;
        reset_latest_update(&mut tx, GEOCODE_TABLE).await?;

        let session = HttpSession::new(&self.config, self.cache_name(), options.cache).await?;
        info!("Fetching: {}", chd_url);
        let response = session.get(chd_url).await?;
        summary.files_fetched += 1;

        let member_name = find_member(&response.body, CHANGE_HISTORY_FILE)?.ok_or_else(|| {
            ImportError::MissingMember {
                member: CHANGE_HISTORY_FILE.to_string(),
                source_url: response.url.clone(),
            }
        })?;
        info!("Opening: {}", member_name);

        let mut archive = open_zip(&response.body)?;
        let member = archive.by_name(&member_name)?;
        let mut rows = CsvRows::new(member, CsvDialect::comma())?;
        let headers = rows.headers().to_vec();

        let cleaner = geocode_cleaner();
        let mut batch = RecordBatch::new();
        let pb = row_spinner(member_name.clone());
        for row in rows.by_ref() {
            let row = row?;
            if let Some(geocode) = parse_geocode(&cleaner, &headers, &row.values) {
                batch.insert(geocode.geogcd.clone(), geocode);
            }
            pb.inc(1);
            if batch.len() >= self.config.bulk_limit {
                self.save(&mut tx, &mut batch, &mut summary).await?;
            }
            if options.stop_after(row.index) {
                break;
            }
        }
        pb.finish_and_clear();
        if rows.skipped() > 0 {
            warn!("Skipped {} malformed rows in {}", rows.skipped(), member_name);
        }
        self.save(&mut tx, &mut batch, &mut summary).await?;

        let result = prune_stale(&mut tx, GEOCODE_TABLE).await?;
        info!("Deleted {} {} records not in latest update", result.deleted, GEOCODE_MODEL);
        summary.record_deleted(GEOCODE_MODEL, result.deleted);

        tx.commit().await?;
        Ok(summary)
    }
}
