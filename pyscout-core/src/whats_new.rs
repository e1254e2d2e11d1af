use crate::error::Result;
use crate::report::Report;
use crate::scrape::{ProgressEvent, ScrapeContext};
use pyscout_scanner::locator::{find_all, find_tag, normalized_text};
use pyscout_scanner::session::resolve_url;
use pyscout_scanner::TagQuery;
use scraper::Html;
use tracing::{info, warn};

pub const HEADER: &[&str] = &["Link", "Title", "Editor, Author"];

/// Links to the per-release "What's New" articles, in page order.
///
/// Items without a usable link are skipped. A missing container is an error.
pub fn extract_whats_new_links(html: &str, whats_new_url: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let main_section = find_tag(
        document.root_element(),
        &TagQuery::new("section").attr("id", "what-s-new-in-python"),
    )?;
    let toctree = find_tag(
        main_section,
        &TagQuery::new("div").attr("class", "toctree-wrapper compound"),
    )?;

    let mut links = Vec::new();
    for item in find_all(toctree, &TagQuery::new("li").attr("class", "toctree-l1")) {
        let Ok(anchor) = find_tag(item, &TagQuery::new("a")) else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            warn!("Link without href in the what's new list");
            continue;
        };
        match resolve_url(whats_new_url, href) {
            Ok(link) => links.push(link),
            Err(e) => warn!(href, error = %e, "Skipping unresolvable link"),
        }
    }
    Ok(links)
}

/// Title and editor/author line of one article.
pub fn extract_whats_new_detail(html: &str) -> Result<(String, String)> {
    let document = Html::parse_document(html);
    let h1 = find_tag(document.root_element(), &TagQuery::new("h1"))?;
    let dl = find_tag(document.root_element(), &TagQuery::new("dl"))?;

    let title = normalized_text(&h1).trim_end_matches('¶').trim_end().to_string();
    Ok((title, normalized_text(&dl)))
}

pub async fn whats_new(ctx: &ScrapeContext) -> Result<Option<Report>> {
    let whats_new_url = ctx.endpoints.whats_new_url()?;
    let Some(page) = ctx.session.get_response(&whats_new_url).await else {
        return Ok(None);
    };

    let links = extract_whats_new_links(&page.text(), &whats_new_url)?;
    info!(count = links.len(), "Found what's new articles");

    let mut report = Report::new(HEADER);
    ctx.report_progress(ProgressEvent::Started { total: links.len() });
    for (index, link) in links.into_iter().enumerate() {
        if let Some(article) = ctx.session.get_response(&link).await {
            match extract_whats_new_detail(&article.text()) {
                Ok((title, editors)) => report.push_row(vec![link.clone(), title, editors]),
                Err(e) => warn!(url = %link, error = %e, "Skipping article"),
            }
        }
        ctx.report_progress(ProgressEvent::Advanced { index, url: link });
    }
    ctx.report_progress(ProgressEvent::Finished);

    Ok(Some(report))
}
