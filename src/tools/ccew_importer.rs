use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::api::{FetchedResponse, HttpSession};
use crate::database::ccew::{upsert_areas_of_operation, upsert_charities, AREA_OF_OPERATION_TABLE, CHARITY_TABLE};
use crate::database::{prune_stale, reset_latest_update, DatabaseManager};
use crate::error::{ImportError, Result};
use crate::models::{
    CcewCharity, CharityAreaOfOperation, Config, DatasetSource, Publisher, OGL_V3_NAME, OGL_V3_URL,
};
use crate::tools::csv_source::{open_zip, zip_members, CsvDialect, CsvRows};
use crate::tools::field_cleaner::{CleanRecord, FieldCleaner};
use crate::tools::import_command::{log_saved, log_saving, row_spinner, ImportCommand, ImportOptions, ImportSummary};
use crate::tools::record_batch::RecordBatch;

pub const CCEW_CACHE_NAME: &str = "ccew_download_cache";

const CHARITY_MODEL: &str = "Charity";
const AREA_MODEL: &str = "CharityAreaOfOperation";

const DATE_FIELDS: [&str; 3] = ["date_of_extract", "date_of_registration", "date_of_removal"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];
const BOOL_FIELDS: [&str; 4] = [
    "charity_insolvent",
    "charity_in_administration",
    "charity_is_cio",
    "welsh_ind",
];

/// The public extract files imported, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcewFile {
    Charity,
    AreaOfOperation,
}

impl CcewFile {
    pub const ALL: [CcewFile; 2] = [CcewFile::Charity, CcewFile::AreaOfOperation];

    pub fn file_name(&self) -> &'static str {
        match self {
            CcewFile::Charity => "publicextract.charity.zip",
            CcewFile::AreaOfOperation => "publicextract.charity_area_of_operation.zip",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            CcewFile::Charity => CHARITY_TABLE,
            CcewFile::AreaOfOperation => AREA_OF_OPERATION_TABLE,
        }
    }

    fn model(&self) -> &'static str {
        match self {
            CcewFile::Charity => CHARITY_MODEL,
            CcewFile::AreaOfOperation => AREA_MODEL,
        }
    }
}

pub fn ccew_cleaner() -> FieldCleaner {
    FieldCleaner::new()
        .with_date_fields(&DATE_FIELDS)
        .with_bool_fields(&BOOL_FIELDS)
        .with_date_formats(&DATE_FORMATS)
}

fn required_numbers(record: &CleanRecord) -> Option<(i64, i64)> {
    Some((record.int("organisation_number")?, record.int("registered_charity_number")?))
}

pub fn parse_charity(record: &CleanRecord) -> Option<CcewCharity> {
    let (organisation_number, registered_charity_number) = required_numbers(record)?;
    Some(CcewCharity {
        organisation_number,
        registered_charity_number,
        linked_charity_number: record.int("linked_charity_number"),
        charity_name: record.non_empty("charity_name"),
        charity_type: record.non_empty("charity_type"),
        charity_registration_status: record.non_empty("charity_registration_status"),
        date_of_registration: record.date("date_of_registration"),
        date_of_removal: record.date("date_of_removal"),
        latest_income: record.float("latest_income"),
        latest_expenditure: record.float("latest_expenditure"),
        charity_contact_postcode: record.non_empty("charity_contact_postcode"),
        charity_contact_web: record.non_empty("charity_contact_web"),
        charity_company_registration_number: record.non_empty("charity_company_registration_number"),
        charity_insolvent: record.bool("charity_insolvent"),
        charity_in_administration: record.bool("charity_in_administration"),
        charity_is_cio: record.bool("charity_is_cio"),
        date_of_extract: record.date("date_of_extract"),
        in_latest_update: true,
    })
}

pub fn parse_area_of_operation(record: &CleanRecord) -> Option<CharityAreaOfOperation> {
    let (organisation_number, registered_charity_number) = required_numbers(record)?;
    Some(CharityAreaOfOperation {
        organisation_number,
        registered_charity_number,
        linked_charity_number: record.int("linked_charity_number"),
        geographic_area_type: record.non_empty("geographic_area_type"),
        geographic_area_description: record.non_empty("geographic_area_description"),
        parent_geographic_area_type: record.non_empty("parent_geographic_area_type"),
        parent_geographic_area_description: record.non_empty("parent_geographic_area_description"),
        welsh_ind: record.bool("welsh_ind"),
        date_of_extract: record.date("date_of_extract"),
        in_latest_update: true,
    })
}

type AreaKey = (i64, Option<String>, Option<String>);

enum CcewBatch {
    Charities(RecordBatch<i64, CcewCharity>),
    Areas(RecordBatch<AreaKey, CharityAreaOfOperation>),
}

impl CcewBatch {
    fn for_file(file: CcewFile) -> Self {
        match file {
            CcewFile::Charity => CcewBatch::Charities(RecordBatch::new()),
            CcewFile::AreaOfOperation => CcewBatch::Areas(RecordBatch::new()),
        }
    }

    fn add(&mut self, record: &CleanRecord) -> bool {
        match self {
            CcewBatch::Charities(batch) => match parse_charity(record) {
                Some(charity) => {
                    batch.insert(charity.organisation_number, charity);
                    true
                }
                None => false,
            },
            CcewBatch::Areas(batch) => match parse_area_of_operation(record) {
                Some(area) => {
                    let key = (
                        area.organisation_number,
                        area.geographic_area_type.clone(),
                        area.geographic_area_description.clone(),
                    );
                    batch.insert(key, area);
                    true
                }
                None => false,
            },
        }
    }

    fn len(&self) -> usize {
        match self {
            CcewBatch::Charities(batch) => batch.len(),
            CcewBatch::Areas(batch) => batch.len(),
        }
    }

    async fn save(&mut self, conn: &mut SqliteConnection, model: &'static str, summary: &mut ImportSummary) -> Result<()> {
        let count = self.len();
        if count == 0 {
            return Ok(());
        }
        log_saving(model, count);
        match self {
            CcewBatch::Charities(batch) => {
                upsert_charities(&mut *conn, &batch.drain()).await?;
            }
            CcewBatch::Areas(batch) => {
                upsert_areas_of_operation(&mut *conn, &batch.drain()).await?;
            }
        }
        let total = summary.record_saved(model, count);
        log_saved(model, count, total);
        Ok(())
    }
}

/// `import-ccew`: the Charity Commission for England & Wales public extract
pub struct CcewImporter {
    config: Config,
}

impl CcewImporter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn file_url(&self, file: CcewFile) -> String {
        format!("{}/{}", self.config.ccew_base_url.trim_end_matches('/'), file.file_name())
    }

    async fn import_file(
        &self,
        conn: &mut SqliteConnection,
        file: CcewFile,
        response: &FetchedResponse,
        options: ImportOptions,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let member_name = zip_members(&response.body)?
            .into_iter()
            .find(|name| name.to_lowercase().ends_with(".txt"))
            .ok_or_else(|| ImportError::MissingMember {
                member: ".txt".to_string(),
                source_url: response.url.clone(),
            })?;
        info!("Opening: {}", member_name);

        let mut archive = open_zip(&response.body)?;
        let member = archive.by_name(&member_name)?;
        let mut rows = CsvRows::new(member, CsvDialect::tab())?;
        let headers = rows.headers().to_vec();

        let cleaner = ccew_cleaner();
        let mut batch = CcewBatch::for_file(file);
        let pb = row_spinner(member_name.clone());
        for row in rows.by_ref() {
            let row = row?;
            let record = cleaner.clean(&headers, &row.values);
            batch.add(&record);
            pb.inc(1);
            if batch.len() >= self.config.bulk_limit {
                batch.save(&mut *conn, file.model(), summary).await?;
            }
            if options.stop_after(row.index) {
                break;
            }
        }
        pb.finish_and_clear();
        if rows.skipped() > 0 {
            warn!("Skipped {} malformed rows in {}", rows.skipped(), member_name);
        }
        batch.save(&mut *conn, file.model(), summary).await
    }
}

#[async_trait(?Send)]
impl ImportCommand for CcewImporter {
    fn name(&self) -> &'static str {
        "import-ccew"
    }

    fn cache_name(&self) -> &'static str {
        CCEW_CACHE_NAME
    }

    fn source(&self) -> DatasetSource {
        DatasetSource {
            title: "Charity Commission for England and Wales register extract".to_string(),
            description: "Data extract of the register of charities in England and Wales, published daily \
                          by the Charity Commission."
                .to_string(),
            identifier: "ccew".to_string(),
            license: OGL_V3_URL.to_string(),
            license_name: OGL_V3_NAME.to_string(),
            publisher: Publisher {
                name: "Charity Commission for England and Wales".to_string(),
                website: "https://www.gov.uk/government/organisations/charity-commission".to_string(),
            },
            distribution: CcewFile::ALL.iter().map(|file| self.file_url(*file)).collect(),
        }
    }

    async fn handle(&self, db: &DatabaseManager, options: ImportOptions) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut tx = db.begin().await?;
        for file in CcewFile::ALL {
            reset_latest_update(&mut tx, file.table()).await?;
        }

        let session = HttpSession::new(&self.config, self.cache_name(), options.cache).await?;
        let mut imported = Vec::new();
        for file in CcewFile::ALL {
            let url = self.file_url(file);
            info!("Fetching: {}", url);
            let response = match session.get(&url).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Error fetching: {}", url);
                    warn!("{}", e);
                    summary.files_failed += 1;
                    continue;
                }
            };
            summary.files_fetched += 1;
            self.import_file(&mut tx, file, &response, options, &mut summary).await?;
            imported.push(file);
        }

        if imported.is_empty() {
            return Err(ImportError::NoFiles(self.config.ccew_base_url.clone()));
        }

        for file in imported {
            let result = prune_stale(&mut tx, file.table()).await?;
            info!("Deleted {} {} records not in latest update", result.deleted, file.model());
            summary.record_deleted(file.model(), result.deleted);
        }

        tx.commit().await?;
        Ok(summary)
    }
}
