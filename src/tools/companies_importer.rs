use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::SqliteConnection;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

use crate::api::{matching_links, FetchedResponse, HttpSession};
use crate::database::companies::{
    run_post_processing, upsert_companies, upsert_company_sic_codes, upsert_previous_names, upsert_sic_codes,
    COMPANY_SIC_CODE_TABLE, COMPANY_TABLE, PREVIOUS_NAME_TABLE,
};
use crate::database::{prune_stale, reset_latest_update, DatabaseManager};
use crate::error::{ImportError, Result};
use crate::models::{
    AccountType, Company, CompanySicCode, CompanyStatus, CompanyType, Config, DatasetSource, PreviousName, Publisher,
    SicCode, OGL_V3_NAME, OGL_V3_URL,
};
use crate::tools::csv_source::{open_zip, CsvDialect, CsvRows};
use crate::tools::field_cleaner::{parse_date, CleanRecord, FieldCleaner};
use crate::tools::import_command::{log_saved, log_saving, row_spinner, ImportCommand, ImportOptions, ImportSummary};
use crate::tools::record_batch::RecordBatch;

pub const COMPANIES_CACHE_NAME: &str = "companies_house_download_cache";

static ZIP_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*/BasicCompanyData-.*\.zip").expect("zip link pattern is valid"));

const DATE_FIELDS: [&str; 8] = [
    "DissolutionDate",
    "IncorporationDate",
    "Accounts_NextDueDate",
    "Accounts_LastMadeUpDate",
    "Returns_NextDueDate",
    "Returns_LastMadeUpDate",
    "ConfStmtNextDueDate",
    "ConfStmtLastMadeUpDate",
];
const DATE_FORMAT: &str = "%d/%m/%Y";

// Model names used in log lines
const COMPANY_MODEL: &str = "Company";
const PREVIOUS_NAME_MODEL: &str = "PreviousName";
const SIC_CODE_MODEL: &str = "SICCode";
const COMPANY_SIC_CODE_MODEL: &str = "CompanySICCode";

/// Everything extracted from one row of the basic company data
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub company: Company,
    pub previous_names: Vec<PreviousName>,
    pub sic_codes: Vec<SicCode>,
    pub company_sic_codes: Vec<CompanySicCode>,
}

pub fn company_cleaner() -> FieldCleaner {
    FieldCleaner::new()
        .with_date_fields(&DATE_FIELDS)
        .with_date_formats(&[DATE_FORMAT])
}

/// Remap a register label through `lookup`, keeping unknown labels as they are
fn clean_category(record: &CleanRecord, field: &str, lookup: impl Fn(&str) -> Option<&'static str>) -> Option<String> {
    record
        .text(field)
        .map(|label| lookup(&label).map(str::to_string).unwrap_or(label))
}

#[derive(Default)]
struct PreviousNameParts {
    company_name: Option<String>,
    con_date: Option<NaiveDate>,
}

/// Turn one CSV row into a company and its previous names and SIC codes.
///
/// `headers` must already be normalised. Rows without a company number yield `None`.
pub fn parse_row(
    cleaner: &FieldCleaner,
    headers: &[String],
    values: &[String],
    run_started: NaiveDateTime,
) -> Option<ParsedRow> {
    let record = cleaner.clean(headers, values);
    let company_number = record.non_empty("CompanyNumber")?.trim().to_string();

    let mut previous_names: BTreeMap<u32, PreviousNameParts> = BTreeMap::new();
    let mut sic_codes = Vec::new();

    for key in record.keys() {
        if let Some(rest) = key.strip_prefix("PreviousName_") {
            let Some((number, field)) = rest.split_once('_') else {
                continue;
            };
            let Ok(number) = number.parse::<u32>() else {
                continue;
            };
            let Some(value) = record.non_empty(key) else {
                continue;
            };
            let parts = previous_names.entry(number).or_default();
            match field {
                "CONDATE" => parts.con_date = parse_date(value.trim(), &[DATE_FORMAT]),
                "CompanyName" => parts.company_name = Some(value),
                _ => {}
            }
        } else if key.starts_with("SICCode_") {
            let Some(value) = record.text(key) else {
                continue;
            };
            if value.replace("None Supplied", "").trim().is_empty() {
                continue;
            }
            let (code, title) = match value.split_once(" - ") {
                Some((code, title)) => (code.trim().to_string(), Some(title.trim().to_string())),
                None => (value.trim().to_string(), None),
            };
            sic_codes.push(SicCode { code, title });
        }
    }

    let company = Company {
        company_number: company_number.clone(),
        company_name: record.text("CompanyName"),
        reg_address_care_of: record.text("RegAddress_CareOf"),
        reg_address_po_box: record.text("RegAddress_POBox"),
        reg_address_address_line1: record.text("RegAddress_AddressLine1"),
        reg_address_address_line2: record.text("RegAddress_AddressLine2"),
        reg_address_post_town: record.text("RegAddress_PostTown"),
        reg_address_county: record.text("RegAddress_County"),
        reg_address_country: record.text("RegAddress_Country"),
        reg_address_post_code: record.text("RegAddress_PostCode"),
        company_category: clean_category(&record, "CompanyCategory", |label| {
            CompanyType::from_register_label(label).map(|t| t.as_str())
        }),
        company_status: clean_category(&record, "CompanyStatus", |label| {
            CompanyStatus::from_register_label(label).map(|s| s.as_str())
        }),
        country_of_origin: record.text("CountryOfOrigin"),
        dissolution_date: record.date("DissolutionDate"),
        incorporation_date: record.date("IncorporationDate"),
        accounts_account_ref_day: record.int("Accounts_AccountRefDay"),
        accounts_account_ref_month: record.int("Accounts_AccountRefMonth"),
        accounts_next_due_date: record.date("Accounts_NextDueDate"),
        accounts_last_made_up_date: record.date("Accounts_LastMadeUpDate"),
        accounts_account_category: clean_category(&record, "Accounts_AccountCategory", |label| {
            AccountType::from_register_label(label).map(|a| a.as_str())
        }),
        returns_next_due_date: record.date("Returns_NextDueDate"),
        returns_last_made_up_date: record.date("Returns_LastMadeUpDate"),
        mortgages_num_mort_charges: record.int("Mortgages_NumMortCharges"),
        mortgages_num_mort_outstanding: record.int("Mortgages_NumMortOutstanding"),
        mortgages_num_mort_part_satisfied: record.int("Mortgages_NumMortPartSatisfied"),
        mortgages_num_mort_satisfied: record.int("Mortgages_NumMortSatisfied"),
        limited_partnerships_num_gen_partners: record.int("LimitedPartnerships_NumGenPartners"),
        limited_partnerships_num_lim_partners: record.int("LimitedPartnerships_NumLimPartners"),
        uri: record.text("URI"),
        conf_stmt_next_due_date: record.date("ConfStmtNextDueDate"),
        conf_stmt_last_made_up_date: record.date("ConfStmtLastMadeUpDate"),
        last_updated: Some(run_started),
        in_latest_update: true,
    };

    let previous_names = previous_names
        .into_values()
        .filter_map(|parts| {
            parts.company_name.map(|company_name| PreviousName {
                company_number: company_number.clone(),
                company_name,
                con_date: parts.con_date,
                in_latest_update: true,
            })
        })
        .collect();

    let company_sic_codes = sic_codes
        .iter()
        .map(|sic| CompanySicCode {
            company_number: company_number.clone(),
            sic_code: sic.code.clone(),
            in_latest_update: true,
        })
        .collect();

    Some(ParsedRow {
        company,
        previous_names,
        sic_codes,
        company_sic_codes,
    })
}

/// Pending records for every companies table
#[derive(Default)]
struct CompanyBatches {
    companies: RecordBatch<String, Company>,
    previous_names: RecordBatch<(String, String), PreviousName>,
    sic_codes: RecordBatch<String, SicCode>,
    company_sic_codes: RecordBatch<(String, String), CompanySicCode>,
    // SIC codes already queued during this run; the first title seen is kept
    registered_sic_codes: HashSet<String>,
}

impl CompanyBatches {
    fn add(&mut self, row: ParsedRow) {
        for sic in row.sic_codes {
            if self.registered_sic_codes.insert(sic.code.clone()) {
                self.sic_codes.insert(sic.code.clone(), sic);
            }
        }
        for name in row.previous_names {
            self.previous_names
                .insert((name.company_number.clone(), name.company_name.clone()), name);
        }
        for link in row.company_sic_codes {
            self.company_sic_codes
                .insert((link.company_number.clone(), link.sic_code.clone()), link);
        }
        self.companies.insert(row.company.company_number.clone(), row.company);
    }

    /// Upsert everything pending, parents before children
    async fn save_all(&mut self, conn: &mut SqliteConnection, summary: &mut ImportSummary) -> Result<()> {
        if !self.sic_codes.is_empty() {
            let records = self.sic_codes.drain();
            log_saving(SIC_CODE_MODEL, records.len());
            upsert_sic_codes(&mut *conn, &records).await?;
            let total = summary.record_saved(SIC_CODE_MODEL, records.len());
            log_saved(SIC_CODE_MODEL, records.len(), total);
        }
        if !self.companies.is_empty() {
            let records = self.companies.drain();
            log_saving(COMPANY_MODEL, records.len());
            upsert_companies(&mut *conn, &records).await?;
            let total = summary.record_saved(COMPANY_MODEL, records.len());
            log_saved(COMPANY_MODEL, records.len(), total);
        }
        if !self.previous_names.is_empty() {
            let records = self.previous_names.drain();
            log_saving(PREVIOUS_NAME_MODEL, records.len());
            upsert_previous_names(&mut *conn, &records).await?;
            let total = summary.record_saved(PREVIOUS_NAME_MODEL, records.len());
            log_saved(PREVIOUS_NAME_MODEL, records.len(), total);
        }
        if !self.company_sic_codes.is_empty() {
            let records = self.company_sic_codes.drain();
            log_saving(COMPANY_SIC_CODE_MODEL, records.len());
            upsert_company_sic_codes(&mut *conn, &records).await?;
            let total = summary.record_saved(COMPANY_SIC_CODE_MODEL, records.len());
            log_saved(COMPANY_SIC_CODE_MODEL, records.len(), total);
        }
        Ok(())
    }
}

/// `import-companies`: the Companies House free company data product
pub struct CompaniesImporter {
    config: Config,
}

impl CompaniesImporter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetch the index page and every data file it links to.
    ///
    /// The index page must load; a failing data file is logged and skipped.
    async fn fetch_files(&self, session: &HttpSession, summary: &mut ImportSummary) -> Result<Vec<FetchedResponse>> {
        let index = session.get(&self.config.companies_start_url).await?;
        let links = matching_links(&index.url, &index.text(), &ZIP_LINK)?;

        let mut files = Vec::new();
        for link in links {
            info!("Fetching: {}", link);
            match session.get(&link).await {
                Ok(response) => {
                    if response.from_cache {
                        info!("From cache");
                    } else {
                        info!("From network");
                    }
                    summary.files_fetched += 1;
                    files.push(response);
                }
                Err(e) => {
                    warn!("Error fetching: {}", link);
                    warn!("{}", e);
                    summary.files_failed += 1;
                }
            }
        }
        Ok(files)
    }

    async fn parse_file(
        &self,
        conn: &mut SqliteConnection,
        file: &FetchedResponse,
        batches: &mut CompanyBatches,
        options: ImportOptions,
        run_started: NaiveDateTime,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        info!("Opening: {}", file.url);
        let cleaner = company_cleaner();
        let mut archive = open_zip(&file.body)?;

        for i in 0..archive.len() {
            let member = archive.by_index(i)?;
            if member.is_dir() {
                continue;
            }
            let member_name = member.name().to_string();
            info!("Opening: {}", member_name);

            let mut rows = CsvRows::new(member, CsvDialect::comma())?;
            let headers = rows.headers().to_vec();
            let pb = row_spinner(member_name.clone());

            for row in rows.by_ref() {
                let row = row?;
                if let Some(parsed) = parse_row(&cleaner, &headers, &row.values, run_started) {
                    batches.add(parsed);
                }
                pb.inc(1);
                if batches.companies.len() >= self.config.bulk_limit {
                    batches.save_all(&mut *conn, summary).await?;
                }
                if options.stop_after(row.index) {
                    break;
                }
            }
            pb.finish_and_clear();
            if rows.skipped() > 0 {
                warn!("Skipped {} malformed rows in {}", rows.skipped(), member_name);
            }

            batches.save_all(&mut *conn, summary).await?;
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl ImportCommand for CompaniesImporter {
    fn name(&self) -> &'static str {
        "import-companies"
    }

    fn cache_name(&self) -> &'static str {
        COMPANIES_CACHE_NAME
    }

    fn source(&self) -> DatasetSource {
        DatasetSource {
            title: "Free Company Data Product".to_string(),
            description: "The Free Company Data Product is a downloadable data snapshot containing basic company \
                          data of live companies on the register. This snapshot is provided as ZIP files \
                          containing data in CSV format and is split into multiple files for ease of downloading."
                .to_string(),
            identifier: "companies".to_string(),
            license: OGL_V3_URL.to_string(),
            license_name: OGL_V3_NAME.to_string(),
            publisher: Publisher {
                name: "Companies House".to_string(),
                website: "https://www.gov.uk/government/organisations/companies-house".to_string(),
            },
            distribution: vec![self.config.companies_start_url.clone()],
        }
    }

    async fn handle(&self, db: &DatabaseManager, options: ImportOptions) -> Result<ImportSummary> {
        let run_started = Local::now().naive_local();
        let mut summary = ImportSummary::default();
        let mut tx = db.begin().await?;

        for table in [COMPANY_TABLE, COMPANY_SIC_CODE_TABLE, PREVIOUS_NAME_TABLE] {
            reset_latest_update(&mut tx, table).await?;
        }

        let session = HttpSession::new(&self.config, self.cache_name(), options.cache).await?;
        if session.is_cached() {
            info!("Using response cache");
        }

        let files = self.fetch_files(&session, &mut summary).await?;
        if files.is_empty() {
            return Err(ImportError::NoFiles(self.config.companies_start_url.clone()));
        }

        let mut batches = CompanyBatches::default();
        for file in &files {
            self.parse_file(&mut tx, file, &mut batches, options, run_started, &mut summary)
                .await?;
        }
        batches.save_all(&mut tx, &mut summary).await?;

        for (table, model) in [
            (COMPANY_SIC_CODE_TABLE, COMPANY_SIC_CODE_MODEL),
            (PREVIOUS_NAME_TABLE, PREVIOUS_NAME_MODEL),
        ] {
            let result = prune_stale(&mut tx, table).await?;
            info!("Deleted {} {} records not in latest update", result.deleted, model);
            summary.record_deleted(model, result.deleted);
        }

        for title in run_post_processing(&mut tx).await? {
            info!("Executed {}", title);
            summary.statements_executed.push(title);
        }

        tx.commit().await?;
        info!(
            "✅ Imported {} companies from {} files",
            summary.saved_for(COMPANY_MODEL),
            summary.files_fetched
        );
        Ok(summary)
    }
}
