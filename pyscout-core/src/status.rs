//! PEP status reconciliation.
//!
//! The numerical index shows each PEP with a one letter status code. The PEP's
//! own page carries the full status name. [`StatusMapping`] says which full
//! names are consistent with each code, and [`get_status`] fetches a PEP page
//! and checks the two against each other.

use crate::error::{Result, ScrapeError};
use pyscout_scanner::locator::{find_tag, find_text_parent, next_sibling_tag, text_of};
use pyscout_scanner::{Session, TagQuery};
use scraper::Html;
use std::collections::HashMap;
use tracing::{debug, warn};

const EXPECTED_STATUS: &[(&str, &[&str])] = &[
    ("A", &["Active", "Accepted"]),
    ("D", &["Deferred"]),
    ("F", &["Final"]),
    ("P", &["Provisional"]),
    ("R", &["Rejected"]),
    ("S", &["Superseded"]),
    ("W", &["Withdrawn"]),
    ("", &["Draft", "Active"]),
];

/// Preview code to the full status names accepted for it.
#[derive(Debug, Clone)]
pub struct StatusMapping {
    expected: HashMap<&'static str, &'static [&'static str]>,
}

impl StatusMapping {
    pub fn new() -> Self {
        Self {
            expected: EXPECTED_STATUS.iter().copied().collect(),
        }
    }

    pub fn expected(&self, preview: &str) -> Result<&'static [&'static str]> {
        self.expected
            .get(preview)
            .copied()
            .ok_or_else(|| ScrapeError::UnknownPreviewStatus(preview.to_string()))
    }

    pub fn is_consistent(&self, preview: &str, actual: &str) -> Result<bool> {
        Ok(self.expected(preview)?.contains(&actual))
    }

    /// Compare `actual` with what `preview` allows and hand `actual` back.
    ///
    /// A mismatch is only logged.
    pub fn reconcile(&self, preview: &str, actual: &str, url: &str) -> Result<String> {
        let expected = self.expected(preview)?;
        if !self.is_consistent(preview, actual)? {
            warn!(
                %url,
                actual,
                expected = ?expected,
                "Mismatched statuses"
            );
        }
        Ok(actual.to_string())
    }
}

impl Default for StatusMapping {
    fn default() -> Self {
        Self::new()
    }
}

/// Preview code from an index `abbr` such as `SF`: everything after the type letter.
pub fn preview_code(abbr: &str) -> String {
    abbr.trim().chars().skip(1).collect()
}

/// Status name from a PEP page: the `abbr` inside the `dd` following "Status".
pub fn extract_actual_status(html: &str, url: &str) -> Result<String> {
    let document = Html::parse_document(html);

    let label = find_text_parent(document.root_element(), "Status")
        .ok_or_else(|| ScrapeError::StatusNotFound(url.to_string()))?;
    let value = next_sibling_tag(&label, "dd")
        .ok_or_else(|| ScrapeError::StatusNotFound(url.to_string()))?;
    let abbr = find_tag(value, &TagQuery::new("abbr"))?;

    Ok(text_of(&abbr).trim().to_string())
}

/// Fetch a PEP page and reconcile its status with the preview code.
///
/// Returns `Ok(None)` when the page could not be fetched.
pub async fn get_status(
    session: &Session,
    mapping: &StatusMapping,
    preview: &str,
    url: &str,
) -> Result<Option<String>> {
    mapping.expected(preview)?;

    let Some(page) = session.get_response(url).await else {
        return Ok(None);
    };

    let actual = extract_actual_status(&page.text(), url)?;
    debug!(%url, preview, %actual, "PEP status");
    mapping.reconcile(preview, &actual, url).map(Some)
}
