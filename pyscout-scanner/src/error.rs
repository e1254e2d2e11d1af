use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Tag not found: <{tag}> {attrs}")]
    TagNotFound { tag: String, attrs: String },
}

pub type Result<T> = std::result::Result<T, ScanError>;
