use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod ccew;
pub mod ccni;
pub mod command_log;
pub mod companies;
pub mod postcodes;

pub use ccew::{CcewCharity, CharityAreaOfOperation};
pub use ccni::{CcniCharity, CharityClassification, ClassificationType};
pub use command_log::{CommandLog, CommandLogStatus};
pub use companies::{AccountType, Company, CompanySicCode, CompanyStatus, CompanyType, PreviousName, SicCode};
pub use postcodes::GeoCode;

pub const DEFAULT_COMPANIES_START_URL: &str = "http://download.companieshouse.gov.uk/en_output.html";
pub const DEFAULT_CCNI_URL: &str = "https://www.charitycommissionni.org.uk/umbraco/api/charityApi/ExportSearchResultsToCsv/?include=Linked&include=Removed";
pub const DEFAULT_CCEW_BASE_URL: &str = "https://ccewuksprdoneregsadata1.blob.core.windows.net/data/txt/";

/// Configuration for the importers
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub debug: bool,
    pub cache_dir: PathBuf,
    pub cache_expire_days: i64,
    pub bulk_limit: usize,
    pub user_agent: String,
    pub companies_start_url: String,
    /// The CHD download moves with every release, so it has no default
    pub chd_url: Option<String>,
    pub ccni_url: String,
    pub ccew_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: "db/charity.db".to_string(),
            debug: false,
            cache_dir: PathBuf::from("db/cache"),
            cache_expire_days: 10,
            bulk_limit: 10_000,
            user_agent: format!("charity-data/{}", env!("CARGO_PKG_VERSION")),
            companies_start_url: DEFAULT_COMPANIES_START_URL.to_string(),
            chd_url: None,
            ccni_url: DEFAULT_CCNI_URL.to_string(),
            ccew_base_url: DEFAULT_CCEW_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();
        Config {
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            debug: std::env::var("DEBUG")
                .map(|v| parse_bool_flag(&v))
                .unwrap_or(defaults.debug),
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            cache_expire_days: std::env::var("CACHE_EXPIRE_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_expire_days),
            bulk_limit: std::env::var("BULK_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.bulk_limit),
            user_agent: std::env::var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            companies_start_url: std::env::var("COMPANIES_START_URL")
                .unwrap_or(defaults.companies_start_url),
            chd_url: std::env::var("CHD_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .or(defaults.chd_url),
            ccni_url: std::env::var("CCNI_URL").unwrap_or(defaults.ccni_url),
            ccew_base_url: std::env::var("CCEW_BASE_URL").unwrap_or(defaults.ccew_base_url),
        }
    }
}

fn parse_bool_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Publisher of a dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Publisher {
    pub name: String,
    pub website: String,
}

/// Provenance metadata describing where a dataset comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSource {
    pub title: String,
    pub description: String,
    pub identifier: String,
    pub license: String,
    pub license_name: String,
    pub publisher: Publisher,
    pub distribution: Vec<String>,
}

pub const OGL_V3_URL: &str = "http://www.nationalarchives.gov.uk/doc/open-government-licence/version/3/";
pub const OGL_V3_NAME: &str = "Open Government Licence v3.0";
