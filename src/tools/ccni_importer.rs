use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::io::Cursor;
use tracing::{debug, info};

use crate::api::HttpSession;
use crate::database::ccni::{upsert_charities, upsert_classifications, CHARITY_TABLE, CLASSIFICATION_TABLE};
use crate::database::{prune_stale, reset_latest_update, DatabaseManager};
use crate::error::Result;
use crate::models::{
    CcniCharity, CharityClassification, ClassificationType, Config, DatasetSource, Publisher, OGL_V3_NAME, OGL_V3_URL,
};
use crate::tools::csv_source::{CsvDialect, CsvRows};
use crate::tools::field_cleaner::{CleanRecord, FieldCleaner};
use crate::tools::import_command::{log_saved, log_saving, row_spinner, ImportCommand, ImportOptions, ImportSummary};
use crate::tools::record_batch::RecordBatch;

pub const CCNI_CACHE_NAME: &str = "ccni_download_cache";

const CHARITY_MODEL: &str = "Charity";
const CLASSIFICATION_MODEL: &str = "CharityClassification";
const DATE_FIELDS: [&str; 2] = ["date_registered", "date_for_financial_year_ending"];

/// `Reg charity number` -> `reg_charity_number`
pub fn snake_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

pub fn ccni_cleaner() -> FieldCleaner {
    FieldCleaner::new()
        .with_date_fields(&DATE_FIELDS)
        .with_date_formats(&["%d/%m/%Y"])
}

/// A register row split into the charity and its classifications
#[derive(Debug, Clone, PartialEq)]
pub struct CcniRow {
    pub charity: CcniCharity,
    pub classifications: Vec<CharityClassification>,
}

fn classifications_for(record: &CleanRecord, charity_id: i64) -> Vec<CharityClassification> {
    let mut classifications = Vec::new();
    for classification_type in ClassificationType::ALL {
        let Some(value) = record.text(classification_type.column()) else {
            continue;
        };
        for classification in value.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            classifications.push(CharityClassification {
                charity_id,
                classification_type,
                classification: classification.to_string(),
                in_latest_update: true,
            });
        }
    }
    classifications
}

/// Map one register row. Rows without a registration number, and linked
/// charities (`sub_charity_number` > 0), yield `None`.
pub fn parse_ccni_row(cleaner: &FieldCleaner, headers: &[String], values: &[String]) -> Option<CcniRow> {
    let record = cleaner.clean(headers, values);
    let reg_charity_number = record.int("reg_charity_number")?;
    let sub_charity_number = record.int("sub_charity_number").unwrap_or(0);
    if sub_charity_number > 0 {
        return None;
    }

    let charity = CcniCharity {
        reg_charity_number,
        sub_charity_number,
        charity_name: record.text("charity_name").unwrap_or_default(),
        date_registered: record.date("date_registered"),
        status: record.non_empty("status"),
        date_for_financial_year_ending: record.date("date_for_financial_year_ending"),
        total_income: record.int("total_income"),
        total_spending: record.int("total_spending"),
        charitable_spending: record.int("charitable_spending"),
        income_generation_and_governance: record.int("income_generation_and_governance"),
        retained_for_future_use: record.int("retained_for_future_use"),
        public_address: record.non_empty("public_address"),
        website: record.non_empty("website"),
        email: record.non_empty("email"),
        telephone: record.non_empty("telephone"),
        company_number: record
            .non_empty("company_number")
            .filter(|number| number.trim() != "0"),
        in_latest_update: true,
    };

    Some(CcniRow {
        classifications: classifications_for(&record, reg_charity_number),
        charity,
    })
}

#[derive(Default)]
struct CcniBatches {
    charities: RecordBatch<i64, CcniCharity>,
    classifications: RecordBatch<(i64, ClassificationType, String), CharityClassification>,
}

impl CcniBatches {
    fn add(&mut self, row: CcniRow) {
        self.charities.insert(row.charity.reg_charity_number, row.charity);
        for c in row.classifications {
            self.classifications
                .insert((c.charity_id, c.classification_type, c.classification.clone()), c);
        }
    }

    async fn save_all(&mut self, conn: &mut SqliteConnection, summary: &mut ImportSummary) -> Result<()> {
        if !self.charities.is_empty() {
            let records = self.charities.drain();
            log_saving(CHARITY_MODEL, records.len());
            upsert_charities(&mut *conn, &records).await?;
            let total = summary.record_saved(CHARITY_MODEL, records.len());
            log_saved(CHARITY_MODEL, records.len(), total);
        }
        if !self.classifications.is_empty() {
            let records = self.classifications.drain();
            log_saving(CLASSIFICATION_MODEL, records.len());
            upsert_classifications(&mut *conn, &records).await?;
            let total = summary.record_saved(CLASSIFICATION_MODEL, records.len());
            log_saved(CLASSIFICATION_MODEL, records.len(), total);
        }
        Ok(())
    }
}

/// `import-ccni`: the Charity Commission for Northern Ireland register
pub struct CcniImporter {
    config: Config,
}

impl CcniImporter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait(?Send)]
impl ImportCommand for CcniImporter {
    fn name(&self) -> &'static str {
        "import-ccni"
    }

    fn cache_name(&self) -> &'static str {
        CCNI_CACHE_NAME
    }

    fn source(&self) -> DatasetSource {
        DatasetSource {
            title: "Charity Commission for Northern Ireland charity search".to_string(),
            description: "The register of charities in Northern Ireland, with financial and classification \
                          details for each registered charity."
                .to_string(),
            identifier: "ccni".to_string(),
            license: OGL_V3_URL.to_string(),
            license_name: OGL_V3_NAME.to_string(),
            publisher: Publisher {
                name: "Charity Commission for Northern Ireland".to_string(),
                website: "https://www.charitycommissionni.org.uk/".to_string(),
            },
            distribution: vec![self.config.ccni_url.clone()],
        }
    }

    async fn handle(&self, db: &DatabaseManager, options: ImportOptions) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut tx = db.begin().await?;
        for table in [CHARITY_TABLE, CLASSIFICATION_TABLE] {
            reset_latest_update(&mut tx, table).await?;
        }

        let session = HttpSession::new(&self.config, self.cache_name(), options.cache).await?;
        info!("Fetching: {}", self.config.ccni_url);
        let response = session.get(&self.config.ccni_url).await?;
        summary.files_fetched += 1;

        let mut rows = CsvRows::new(Cursor::new(response.body.as_slice()), CsvDialect::comma())?;
        rows.rename_headers(snake_header);
        let headers = rows.headers().to_vec();

        let cleaner = ccni_cleaner();
        let mut batches = CcniBatches::default();
        let mut linked_skipped = 0;
        let pb = row_spinner("charities");
        for row in rows.by_ref() {
            let row = row?;
            match parse_ccni_row(&cleaner, &headers, &row.values) {
                Some(parsed) => batches.add(parsed),
                None => linked_skipped += 1,
            }
            pb.inc(1);
            if batches.charities.len() >= self.config.bulk_limit {
                batches.save_all(&mut tx, &mut summary).await?;
            }
            if options.stop_after(row.index) {
                break;
            }
        }
        pb.finish_and_clear();
        batches.save_all(&mut tx, &mut summary).await?;
        debug!(
            "Skipped {} linked or unnumbered rows and {} malformed rows",
            linked_skipped,
            rows.skipped()
        );

        let result = prune_stale(&mut tx, CLASSIFICATION_TABLE).await?;
        info!(
            "Deleted {} {} records not in latest update",
            result.deleted, CLASSIFICATION_MODEL
        );
        summary.record_deleted(CLASSIFICATION_MODEL, result.deleted);

        tx.commit().await?;
        Ok(summary)
    }
}
