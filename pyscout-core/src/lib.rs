pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod pep;
pub mod report;
pub mod scrape;
pub mod status;
pub mod versions;
pub mod whats_new;

pub use error::{Result, ScrapeError};
pub use scrape::{Mode, ProgressCallback, ProgressEvent, ScrapeContext, run_mode};
