// Fixed locations and formats used by the scrape routines

use crate::error::Result;
use pyscout_scanner::session::resolve_url;

pub const MAIN_DOC_URL: &str = "https://docs.python.org/3/";
pub const MAIN_PEPS_URL: &str = "https://peps.python.org/";

/// Archive flavour to fetch: zipped PDF with A4 pages.
pub const DL_LINK_PATTERN: &str = r".+pdf-a4\.zip$";

pub const PY_VERSION_STATUS_PATTERN: &str = r"Python (?P<version>\d\.\d+) \((?P<status>.*)\)";

pub const DATETIME_FORMAT: &str = "%d.%m.%Y_%H-%M-%S";

pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

/// Base URLs of the two sites being scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub docs_url: String,
    pub peps_url: String,
}

impl Endpoints {
    pub fn new(docs_url: &str, peps_url: &str) -> Self {
        Self {
            docs_url: docs_url.to_string(),
            peps_url: peps_url.to_string(),
        }
    }

    pub fn whats_new_url(&self) -> Result<String> {
        Ok(resolve_url(&self.docs_url, "whatsnew/")?)
    }

    pub fn downloads_url(&self) -> Result<String> {
        Ok(resolve_url(&self.docs_url, "download.html")?)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(MAIN_DOC_URL, MAIN_PEPS_URL)
    }
}
