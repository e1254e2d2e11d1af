use pyscout_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Python versions list not found in the sidebar")]
    VersionsListNotFound,

    #[error("Unknown preview status: {0:?}")]
    UnknownPreviewStatus(String),

    #[error("Status field not found on {0}")]
    StatusNotFound(String),

    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
