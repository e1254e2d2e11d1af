use crate::error::Result;
use crate::report::Report;
use crate::scrape::{ProgressEvent, ScrapeContext};
use crate::status::{get_status, preview_code};
use pyscout_scanner::locator::{find_all, find_tag, text_of};
use pyscout_scanner::session::resolve_url;
use pyscout_scanner::TagQuery;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use tracing::{info, warn};

pub const HEADER: &[&str] = &["Status", "Count"];
pub const TOTAL_LABEL: &str = "Total";

static PEP_ROW_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"row-(odd|even)").expect("row pattern is valid"));

/// One row of the numerical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PepEntry {
    pub preview_status: String,
    pub url: String,
}

/// Status counts in first-seen order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusTally {
    counts: Vec<(String, usize)>,
}

impl StatusTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, status: &str) {
        match self.counts.iter_mut().find(|(name, _)| name == status) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((status.to_string(), 1)),
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    /// Per-status rows followed by the `Total` row.
    pub fn into_report(self) -> Report {
        let mut report = Report::new(HEADER);
        let total = self.total();
        for (status, count) in self.counts {
            report.push_row(vec![status, count.to_string()]);
        }
        report.push_row(vec![TOTAL_LABEL.to_string(), total.to_string()]);
        report
    }
}

/// Every PEP listed in the numerical index with its preview status and page URL.
///
/// Rows without an `abbr` or a link are skipped. A missing index table is an error.
pub fn extract_pep_index(html: &str, peps_url: &str) -> Result<Vec<PepEntry>> {
    let document = Html::parse_document(html);
    let section = find_tag(
        document.root_element(),
        &TagQuery::new("section").attr("id", "numerical-index"),
    )?;
    let table_body = find_tag(section, &TagQuery::new("tbody"))?;

    let rows = find_all(
        table_body,
        &TagQuery::new("tr").attr("class", PEP_ROW_CLASS.clone()),
    );
    Ok(rows
        .into_iter()
        .filter_map(|row| pep_entry(row, peps_url))
        .collect())
}

fn pep_entry(row: ElementRef, peps_url: &str) -> Option<PepEntry> {
    let abbr = find_tag(row, &TagQuery::new("abbr")).ok()?;
    let anchor = find_tag(row, &TagQuery::new("a")).ok()?;
    let href = anchor.value().attr("href")?;

    match resolve_url(peps_url, href) {
        Ok(url) => Some(PepEntry {
            preview_status: preview_code(&text_of(&abbr)),
            url,
        }),
        Err(e) => {
            warn!(href, error = %e, "Skipping PEP with unresolvable link");
            None
        }
    }
}

/// Count PEPs by the status on their own pages.
///
/// A PEP whose page cannot be fetched or read is left out of the counts.
pub async fn pep(ctx: &ScrapeContext) -> Result<Option<Report>> {
    let peps_url = &ctx.endpoints.peps_url;
    let Some(page) = ctx.session.get_response(peps_url).await else {
        return Ok(None);
    };

    let entries = extract_pep_index(&page.text(), peps_url)?;
    info!(count = entries.len(), "Found PEPs in the numerical index");

    let mut tally = StatusTally::new();
    let mut skipped = 0;
    ctx.report_progress(ProgressEvent::Started {
        total: entries.len(),
    });
    for (index, entry) in entries.into_iter().enumerate() {
        match get_status(&ctx.session, &ctx.statuses, &entry.preview_status, &entry.url).await {
            Ok(Some(status)) => tally.add(&status),
            Ok(None) => {
                skipped += 1;
                warn!(url = %entry.url, "Skipping PEP, page unavailable");
            }
            Err(e) => {
                skipped += 1;
                warn!(url = %entry.url, error = %e, "Skipping PEP");
            }
        }
        ctx.report_progress(ProgressEvent::Advanced {
            index,
            url: entry.url,
        });
    }
    ctx.report_progress(ProgressEvent::Finished);

    info!(counted = tally.total(), skipped, "PEP statuses reconciled");
    Ok(Some(tally.into_report()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<html><body>
        <section id="numerical-index">
            <table class="pep-zero-table docutils align-default">
                <thead><tr class="row-odd"><th>Num</th><th>Title</th></tr></thead>
                <tbody>
                    <tr class="row-even"><td><abbr title="Process, Active">PA</abbr></td>
                        <td><a class="pep reference internal" href="pep-0001/">1</a></td></tr>
                    <tr class="row-odd"><td><abbr title="Standards Track, Final">SF</abbr></td>
                        <td><a class="pep reference internal" href="pep-0008/">8</a></td></tr>
                    <tr class="row-even"><td><abbr title="Informational, Draft">I</abbr></td>
                        <td><a class="pep reference internal" href="pep-0801/">801</a></td></tr>
                    <tr class="row-odd"><td>broken row</td></tr>
                    <tr class="header"><td><abbr>SF</abbr></td><td><a href="pep-9999/">x</a></td></tr>
                </tbody>
            </table>
        </section></body></html>"#;

    #[test]
    fn test_extract_pep_index() {
        let entries = extract_pep_index(INDEX, "https://peps.python.org/").unwrap();

        assert_eq!(
            entries,
            vec![
                PepEntry {
                    preview_status: "A".to_string(),
                    url: "https://peps.python.org/pep-0001/".to_string(),
                },
                PepEntry {
                    preview_status: "F".to_string(),
                    url: "https://peps.python.org/pep-0008/".to_string(),
                },
                PepEntry {
                    preview_status: String::new(),
                    url: "https://peps.python.org/pep-0801/".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_pep_index_without_section() {
        let html = "<html><body><table><tbody></tbody></table></body></html>";
        assert!(extract_pep_index(html, "https://peps.python.org/").is_err());
    }

    #[test]
    fn test_tally_keeps_first_seen_order() {
        let mut tally = StatusTally::new();
        for status in ["Final", "Active", "Final", "Draft", "Final"] {
            tally.add(status);
        }

        assert_eq!(tally.total(), 5);

        let report = tally.into_report();
        assert_eq!(report.header(), ["Status", "Count"]);
        assert_eq!(
            report.rows(),
            [
                vec!["Final".to_string(), "3".to_string()],
                vec!["Active".to_string(), "1".to_string()],
                vec!["Draft".to_string(), "1".to_string()],
                vec!["Total".to_string(), "5".to_string()],
            ]
        );
    }

    #[test]
    fn test_empty_tally_has_zero_total() {
        let report = StatusTally::new().into_report();
        assert_eq!(report.rows(), [vec!["Total".to_string(), "0".to_string()]]);
    }
}
