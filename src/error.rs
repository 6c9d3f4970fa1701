use thiserror::Error;

/// Errors raised while fetching, parsing or persisting a dataset
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{member} not found in {source_url}")]
    MissingMember { member: String, source_url: String },

    #[error("No files could be fetched from {0}")]
    NoFiles(String),

    #[error("{0} is not set")]
    MissingSetting(&'static str),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid options for {command}: {message}")]
    InvalidOptions { command: String, message: String },
}

pub type Result<T> = std::result::Result<T, ImportError>;
