use crate::config::DL_LINK_PATTERN;
use crate::error::Result;
use crate::report::Report;
use crate::scrape::ScrapeContext;
use pyscout_scanner::session::{file_name_from_url, resolve_url};
use pyscout_scanner::{ScanError, TagQuery, find_tag};
use regex::Regex;
use scraper::Html;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{info, warn};

static ARCHIVE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DL_LINK_PATTERN).expect("archive pattern is valid"));

/// Absolute URL of the A4 PDF archive listed on the downloads page.
pub fn find_archive_link(html: &str, downloads_url: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let main = find_tag(
        document.root_element(),
        &TagQuery::new("div").attr("role", "main"),
    )?;
    let table = find_tag(main, &TagQuery::new("table").attr("class", "docutils"))?;
    let anchor = find_tag(
        table,
        &TagQuery::new("a").attr("href", ARCHIVE_LINK.clone()),
    )?;

    // the query only matches anchors that carry an href
    let href = anchor.value().attr("href").unwrap_or_default();
    Ok(resolve_url(downloads_url, href)?)
}

/// Fetch the archive and store it under the downloads directory.
///
/// Returns the written path, or `None` when a page or the archive could not be fetched.
pub async fn download_archive(ctx: &ScrapeContext) -> Result<Option<PathBuf>> {
    let downloads_url = ctx.endpoints.downloads_url()?;
    let Some(page) = ctx.session.get_response(&downloads_url).await else {
        return Ok(None);
    };

    let archive_url = find_archive_link(&page.text(), &downloads_url)?;
    let file_name = file_name_from_url(&archive_url)
        .ok_or_else(|| ScanError::InvalidUrl(format!("no file name in {}", archive_url)))?;

    let Some(archive) = ctx.session.get_response(&archive_url).await else {
        warn!(url = %archive_url, "Archive could not be downloaded");
        return Ok(None);
    };

    tokio::fs::create_dir_all(&ctx.downloads_dir).await?;
    let archive_path = ctx.downloads_dir.join(file_name);
    tokio::fs::write(&archive_path, &archive.body).await?;
    info!(
        path = %archive_path.display(),
        bytes = archive.body.len(),
        "Archive downloaded and saved"
    );

    Ok(Some(archive_path))
}

/// The download routine produces a file, never a report.
pub async fn download(ctx: &ScrapeContext) -> Result<Option<Report>> {
    download_archive(ctx).await?;
    Ok(None)
}
