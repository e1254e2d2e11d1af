use crate::config::PY_VERSION_STATUS_PATTERN;
use crate::error::{Result, ScrapeError};
use crate::report::Report;
use crate::scrape::ScrapeContext;
use pyscout_scanner::locator::{find_all, find_tag, normalized_text, text_of};
use pyscout_scanner::session::resolve_url;
use pyscout_scanner::TagQuery;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use tracing::{info, warn};

pub const HEADER: &[&str] = &["Documentation link", "Version", "Status"];

const ALL_VERSIONS_MARKER: &str = "All versions";

static VERSION_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PY_VERSION_STATUS_PATTERN).expect("version pattern is valid"));

/// Split a sidebar entry like `Python 3.13 (stable)` into version and status.
///
/// Text that does not follow that shape is kept whole with an empty status.
pub fn parse_version_label(label: &str) -> (String, String) {
    match VERSION_STATUS.captures(label) {
        Some(caps) => (caps["version"].to_string(), caps["status"].to_string()),
        None => (label.to_string(), String::new()),
    }
}

/// Rows for every link in the sidebar list that mentions "All versions".
pub fn extract_versions(html: &str, docs_url: &str) -> Result<Vec<Vec<String>>> {
    let document = Html::parse_document(html);
    let sidebar = find_tag(
        document.root_element(),
        &TagQuery::new("div").attr("class", "sphinxsidebarwrapper"),
    )?;

    let versions_list = find_all(sidebar, &TagQuery::new("ul"))
        .into_iter()
        .find(|ul| text_of(ul).contains(ALL_VERSIONS_MARKER))
        .ok_or(ScrapeError::VersionsListNotFound)?;

    let mut rows = Vec::new();
    for anchor in find_all(versions_list, &TagQuery::new("a")) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let link = match resolve_url(docs_url, href) {
            Ok(link) => link,
            Err(e) => {
                warn!(href, error = %e, "Skipping unresolvable version link");
                continue;
            }
        };
        let (version, status) = parse_version_label(&normalized_text(&anchor));
        rows.push(vec![link, version, status]);
    }
    Ok(rows)
}

pub async fn latest_versions(ctx: &ScrapeContext) -> Result<Option<Report>> {
    let docs_url = &ctx.endpoints.docs_url;
    let Some(page) = ctx.session.get_response(docs_url).await else {
        return Ok(None);
    };

    let rows = extract_versions(&page.text(), docs_url)?;
    info!(count = rows.len(), "Found Python versions");

    let mut report = Report::new(HEADER);
    for row in rows {
        report.push_row(row);
    }
    Ok(Some(report))
}
