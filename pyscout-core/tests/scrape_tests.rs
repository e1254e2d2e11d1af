// End-to-end tests for the scrape routines against a mock documentation site

use pyscout_core::config::Endpoints;
use pyscout_core::download::download_archive;
use pyscout_core::{Mode, ProgressEvent, ScrapeContext, ScrapeError, run_mode};
use pyscout_scanner::Session;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_bytes(body.as_bytes())
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn context(server: &MockServer, downloads_dir: PathBuf) -> ScrapeContext {
    let endpoints = Endpoints::new(
        &format!("{}/3/", server.uri()),
        &format!("{}/peps/", server.uri()),
    );
    ScrapeContext::new(Session::with_timeout(5).unwrap(), endpoints, downloads_dir)
}

fn pep_page(status: &str) -> String {
    format!(
        r#"<html><body><dl class="rfc2822 field-list simple">
            <dt class="field-odd">Status<span class="colon">:</span></dt>
            <dd class="field-odd"><abbr title="{status}">{status}</abbr></dd>
        </dl></body></html>"#
    )
}

// ============================================================================
// what's new
// ============================================================================

#[tokio::test]
async fn test_whats_new_builds_one_row_per_article() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/3/whatsnew/",
        r#"<html><body><section id="what-s-new-in-python">
            <div class="toctree-wrapper compound"><ul>
                <li class="toctree-l1"><a href="3.13.html">Python 3.13</a></li>
                <li class="toctree-l1"><a href="3.12.html">Python 3.12</a></li>
                <li class="toctree-l1"><a href="3.11.html">Python 3.11</a></li>
            </ul></div></section></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/3/whatsnew/3.13.html",
        r#"<html><body><h1>What’s New In Python 3.13</h1>
            <dl>
                <dt>Editors</dt>
                <dd>Adam Turner and Thomas Wouters</dd>
            </dl></body></html>"#,
    )
    .await;
    // 3.12 has no editor list and is skipped
    mount_page(
        &server,
        "/3/whatsnew/3.12.html",
        "<html><body><h1>What’s New In Python 3.12</h1></body></html>",
    )
    .await;
    // 3.11 is not served at all
    Mock::given(method("GET"))
        .and(path("/3/whatsnew/3.11.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().join("downloads")).with_progress_callback(
        Arc::new(move |event| events_clone.lock().unwrap().push(event)),
    );

    let report = run_mode(Mode::WhatsNew, &ctx).await.unwrap().unwrap();

    assert_eq!(report.header(), ["Link", "Title", "Editor, Author"]);
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.rows()[0],
        vec![
            format!("{}/3/whatsnew/3.13.html", server.uri()),
            "What’s New In Python 3.13".to_string(),
            "Editors Adam Turner and Thomas Wouters".to_string(),
        ]
    );

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&ProgressEvent::Started { total: 3 }));
    assert_eq!(events.last(), Some(&ProgressEvent::Finished));
    assert_eq!(events.len(), 5);
}

#[tokio::test]
async fn test_whats_new_without_index_page_returns_nothing() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().to_path_buf());

    let report = run_mode(Mode::WhatsNew, &ctx).await.unwrap();

    assert!(report.is_none());
}

#[tokio::test]
async fn test_whats_new_missing_container_aborts() {
    let server = MockServer::start().await;
    mount_page(&server, "/3/whatsnew/", "<html><body><p>moved</p></body></html>").await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().to_path_buf());

    let result = run_mode(Mode::WhatsNew, &ctx).await;

    assert!(matches!(result, Err(ScrapeError::Scan(_))));
}

// ============================================================================
// latest versions
// ============================================================================

#[tokio::test]
async fn test_latest_versions_lists_versions() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/3/",
        r#"<html><body><div class="sphinxsidebarwrapper">
            <ul><li><a href="https://docs.python.org/3.13/">Python 3.13 (stable)</a></li>
                <li><a href="https://docs.python.org/3.9/">Python 3.9 (security-fixes)</a></li>
                <li><a href="https://www.python.org/doc/versions/">All versions</a></li></ul>
        </div></body></html>"#,
    )
    .await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().to_path_buf());

    let report = run_mode(Mode::LatestVersions, &ctx).await.unwrap().unwrap();

    assert_eq!(report.header(), ["Documentation link", "Version", "Status"]);
    assert_eq!(report.len(), 3);
    assert_eq!(
        report.rows()[1],
        vec!["https://docs.python.org/3.9/", "3.9", "security-fixes"]
    );
}

#[tokio::test]
async fn test_latest_versions_without_all_versions_fails_fast() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/3/",
        r#"<html><body><div class="sphinxsidebarwrapper">
            <ul><li><a href="index.html">Contents</a></li></ul>
            <ul><li><a href="https://docs.python.org/3.13/">Python 3.13 (stable)</a></li></ul>
        </div></body></html>"#,
    )
    .await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().to_path_buf());

    let result = run_mode(Mode::LatestVersions, &ctx).await;

    assert!(matches!(result, Err(ScrapeError::VersionsListNotFound)));
}

// ============================================================================
// download
// ============================================================================

#[tokio::test]
async fn test_download_writes_archive_bytes() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/3/download.html",
        r#"<html><body><div role="main"><table class="docutils">
            <tr><td><a href="archives/python-3.13-docs-pdf-letter.zip">Letter</a></td></tr>
            <tr><td><a href="archives/python-3.13-docs-pdf-a4.zip">A4</a></td></tr>
        </table></div></body></html>"#,
    )
    .await;

    let archive: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    Mock::given(method("GET"))
        .and(path("/3/archives/python-3.13-docs-pdf-a4.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(archive.clone()),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let downloads_dir = temp_dir.path().join("downloads");
    let ctx = context(&server, downloads_dir.clone());

    let written = download_archive(&ctx).await.unwrap().unwrap();

    assert_eq!(written, downloads_dir.join("python-3.13-docs-pdf-a4.zip"));
    assert_eq!(std::fs::read(&written).unwrap(), archive);
}

#[tokio::test]
async fn test_download_routine_produces_no_report() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/3/download.html",
        r#"<html><body><div role="main"><table class="docutils">
            <tr><td><a href="archives/docs-pdf-a4.zip">A4</a></td></tr>
        </table></div></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/3/archives/docs-pdf-a4.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK".to_vec()))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().join("downloads"));

    let report = run_mode(Mode::Download, &ctx).await.unwrap();

    assert!(report.is_none());
    assert!(temp_dir.path().join("downloads/docs-pdf-a4.zip").exists());
}

#[tokio::test]
async fn test_download_missing_archive_link_aborts() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/3/download.html",
        r#"<html><body><div role="main"><table class="docutils">
            <tr><td><a href="archives/docs-html.zip">HTML</a></td></tr>
        </table></div></body></html>"#,
    )
    .await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().join("downloads"));

    let result = download_archive(&ctx).await;

    assert!(matches!(result, Err(ScrapeError::Scan(_))));
    assert!(!temp_dir.path().join("downloads").exists());
}

// ============================================================================
// pep
// ============================================================================

const PEP_INDEX: &str = r#"<html><body><section id="numerical-index"><table><tbody>
    <tr class="row-odd"><td><abbr>PA</abbr></td><td><a href="pep-0001/">1</a></td></tr>
    <tr class="row-even"><td><abbr>SF</abbr></td><td><a href="pep-0008/">8</a></td></tr>
    <tr class="row-odd"><td><abbr>SA</abbr></td><td><a href="pep-0020/">20</a></td></tr>
    <tr class="row-even"><td><abbr>SR</abbr></td><td><a href="pep-0042/">42</a></td></tr>
    <tr class="row-odd"><td><abbr>S</abbr></td><td><a href="pep-0099/">99</a></td></tr>
    <tr class="row-even"><td><abbr>SF</abbr></td><td><a href="pep-0404/">404</a></td></tr>
</tbody></table></section></body></html>"#;

#[tokio::test]
async fn test_pep_counts_actual_statuses() {
    let server = MockServer::start().await;
    mount_page(&server, "/peps/", PEP_INDEX).await;
    mount_page(&server, "/peps/pep-0001/", &pep_page("Active")).await;
    mount_page(&server, "/peps/pep-0008/", &pep_page("Final")).await;
    // Index says accepted, page says final: counted under the page's status
    mount_page(&server, "/peps/pep-0020/", &pep_page("Final")).await;
    mount_page(&server, "/peps/pep-0042/", &pep_page("Rejected")).await;
    mount_page(&server, "/peps/pep-0099/", &pep_page("Draft")).await;
    // pep-0404 is never served and is left out

    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().to_path_buf());

    let report = run_mode(Mode::Pep, &ctx).await.unwrap().unwrap();

    assert_eq!(report.header(), ["Status", "Count"]);
    assert_eq!(
        report.rows(),
        [
            vec!["Active".to_string(), "1".to_string()],
            vec!["Final".to_string(), "2".to_string()],
            vec!["Rejected".to_string(), "1".to_string()],
            vec!["Draft".to_string(), "1".to_string()],
            vec!["Total".to_string(), "5".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_pep_total_is_sum_of_counts() {
    let server = MockServer::start().await;
    mount_page(&server, "/peps/", PEP_INDEX).await;
    for (route, status) in [
        ("/peps/pep-0001/", "Active"),
        ("/peps/pep-0008/", "Final"),
        ("/peps/pep-0020/", "Accepted"),
        ("/peps/pep-0042/", "Rejected"),
        ("/peps/pep-0099/", "Draft"),
        ("/peps/pep-0404/", "Final"),
    ] {
        mount_page(&server, route, &pep_page(status)).await;
    }

    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().to_path_buf());

    let report = run_mode(Mode::Pep, &ctx).await.unwrap().unwrap();
    let rows = report.rows();
    let (total_row, status_rows) = rows.split_last().unwrap();

    let sum: usize = status_rows
        .iter()
        .map(|row| row[1].parse::<usize>().unwrap())
        .sum();
    assert_eq!(total_row[0], "Total");
    assert_eq!(total_row[1], sum.to_string());
    assert_eq!(sum, 6);
}

#[tokio::test]
async fn test_pep_missing_index_table_aborts() {
    let server = MockServer::start().await;
    mount_page(&server, "/peps/", "<html><body><section id=\"intro\"></section></body></html>").await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&server, temp_dir.path().to_path_buf());

    let result = run_mode(Mode::Pep, &ctx).await;

    assert!(matches!(result, Err(ScrapeError::Scan(_))));
}
