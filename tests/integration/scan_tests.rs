//! Integration tests for the scan pipeline
//!
//! These tests use wiremock to serve small sites and drive full scans,
//! crawl through analysis, against a temporary database.

use site_audit::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use site_audit::storage::{open_storage, with_storage, PageRecord, SharedStorage, Storage};
use site_audit::{AuditError, PageChange, Pipeline, ScanStatus};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(db_path: &str, auto_analyze: bool) -> Config {
    Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 5,
            check_timeout_secs: 2,
            auto_analyze,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestAudit".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

/// Opens a fresh database with no request delay and the given page budget
fn setup(max_pages: usize, auto_analyze: bool) -> (TempDir, Pipeline) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("audit.db");
    let db_path = db_path.to_str().expect("temp path is utf-8").to_string();

    let storage = open_storage(std::path::Path::new(&db_path)).expect("Failed to open storage");
    with_storage(&storage, |s| {
        s.set_setting("request_delay_ms", "0")?;
        s.set_setting("max_pages_limit", &max_pages.to_string())
    })
    .expect("Failed to write settings");

    let pipeline = Pipeline::new(storage, create_test_config(&db_path, auto_analyze))
        .expect("Failed to build pipeline");
    (dir, pipeline)
}

fn html(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>"#,
        title, title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html"))
        .mount(server)
        .await;
}

async fn mount_sitemap(server: &MockServer, locs: &[String]) {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    );

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(xml.into_bytes(), "application/xml"))
        .mount(server)
        .await;
}

/// Every link check succeeds
async fn mount_head_ok(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn pages_of(storage: &SharedStorage, scan_id: i64) -> Vec<PageRecord> {
    with_storage(storage, |s| s.get_pages(scan_id)).expect("Failed to load pages")
}

fn page<'a>(pages: &'a [PageRecord], url: &str) -> &'a PageRecord {
    pages
        .iter()
        .find(|p| p.url == url)
        .unwrap_or_else(|| panic!("no page row for {}", url))
}

/// Creates a scan and runs it in the foreground
async fn run(pipeline: &Pipeline, start_url: &str) -> (i64, ScanStatus) {
    let scan_id = with_storage(pipeline.storage(), |s| s.create_scan(start_url))
        .expect("Failed to create scan");
    let status = pipeline.run_scan(scan_id).await;
    (scan_id, status)
}

#[tokio::test]
async fn test_end_to_end_orphan_detection() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html("Home", r#"<p>Welcome to the site.</p><a href="/about">About us</a>"#),
    )
    .await;
    mount_page(&server, "/about", html("About", "<p>About the team.</p>")).await;
    mount_sitemap(
        &server,
        &[
            format!("{}/", base),
            format!("{}/about", base),
            format!("{}/orphan", base),
        ],
    )
    .await;
    mount_head_ok(&server).await;

    let (_dir, pipeline) = setup(3, true);

    let scan_id = pipeline.start_scan(&base).expect("Failed to start scan");

    // The scan runs on its own task; wait for it through the stored status
    let mut status = pipeline.scan_status(scan_id).unwrap();
    for _ in 0..100 {
        if !status.is_active() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        status = pipeline.scan_status(scan_id).unwrap();
    }
    assert_eq!(status, ScanStatus::Completed);

    let scan = with_storage(pipeline.storage(), |s| s.get_scan(scan_id)).unwrap();
    assert_eq!(scan.new_pages, 2, "exactly two pages are fetched");
    assert_eq!(scan.updated_pages, 0);
    assert!(scan.report.is_some());
    assert!(scan.finished_at.is_some());

    let pages = pages_of(pipeline.storage(), scan_id);
    assert_eq!(pages.len(), 3);

    let home = page(&pages, &base);
    assert_eq!(home.status_code, 200);
    assert_eq!(home.title, "Home");
    assert!(!home.is_orphan);

    let about = page(&pages, &format!("{}/about", base));
    assert_eq!(about.status_code, 200);
    assert_eq!(about.incoming_links, 1);
    assert!(!about.is_orphan);

    let orphan = page(&pages, &format!("{}/orphan", base));
    assert_eq!(orphan.status_code, 404);
    assert!(orphan.is_orphan);
    assert_eq!(orphan.change, PageChange::Existing);

    let links = with_storage(pipeline.storage(), |s| s.get_links(scan_id)).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target_url, format!("{}/about", base));
    assert_eq!(links[0].anchor_text, "About us");
    assert!(!links[0].is_broken);

    let (_, report) = site_audit::output::load_scan_report(pipeline.storage(), scan_id).unwrap();
    assert_eq!(report.orphaned_pages.len(), 1);
    assert_eq!(report.orphaned_pages[0].url, format!("{}/orphan", base));
    assert_eq!(report.total_issues() as u32, scan.total_issues);
}

#[tokio::test]
async fn test_page_budget_is_respected() {
    let server = MockServer::start().await;

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", html("Home", &links)).await;
    for i in 1..=5 {
        mount_page(&server, &format!("/p{}", i), html(&format!("Page {}", i), &links)).await;
    }
    mount_head_ok(&server).await;

    let (_dir, pipeline) = setup(2, false);
    let (scan_id, status) = run(&pipeline, &server.uri()).await;
    assert_eq!(status, ScanStatus::Crawled);

    let scan = with_storage(pipeline.storage(), |s| s.get_scan(scan_id)).unwrap();
    let fetched = scan.new_pages + scan.updated_pages + scan.unchanged_pages;
    assert!(fetched <= 2, "fetched {} pages with a budget of 2", fetched);

    let gets = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.to_string() == "GET" && r.url.path() != "/sitemap.xml")
        .count();
    assert!(gets <= 2);

    let pages = pages_of(pipeline.storage(), scan_id);
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| p.status_code == 200));
}

#[tokio::test]
async fn test_crawl_stays_on_domain() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(
            "Home",
            &format!(
                r#"<a href="/inside">Inside</a><a href="{}/elsewhere">Elsewhere</a>"#,
                external.uri()
            ),
        ),
    )
    .await;
    mount_page(&server, "/inside", html("Inside", "<p>Still here.</p>")).await;
    mount_head_ok(&server).await;
    mount_page(&external, "/elsewhere", html("Elsewhere", "<p>Gone.</p>")).await;
    mount_head_ok(&external).await;

    let (_dir, pipeline) = setup(10, true);
    let (scan_id, status) = run(&pipeline, &base).await;
    assert_eq!(status, ScanStatus::Completed);

    let pages = pages_of(pipeline.storage(), scan_id);
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| p.url.starts_with(&base)));

    let links = with_storage(pipeline.storage(), |s| s.get_links(scan_id)).unwrap();
    assert!(links.iter().all(|l| l.target_url.starts_with(&base)));

    // The other host is never contacted, not even for a link check
    let external_requests = external.received_requests().await.unwrap_or_default();
    assert!(external_requests.is_empty());

    // ...but it still counts towards the page's external links
    let home = page(&pages, &base);
    assert_eq!(home.metrics.internal_links, 1);
    assert_eq!(home.metrics.external_links, 1);
}

#[tokio::test]
async fn test_second_scan_classifies_changes() {
    let server = MockServer::start().await;
    let base = server.uri();

    let home = html(
        "Home",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
    );

    mount_page(&server, "/", home.clone()).await;
    mount_page(&server, "/a", html("A", "<p>First version.</p>")).await;
    mount_page(&server, "/b", html("B", "<p>Stable page.</p>")).await;
    mount_head_ok(&server).await;

    let (_dir, pipeline) = setup(20, true);

    let (first_id, status) = run(&pipeline, &base).await;
    assert_eq!(status, ScanStatus::Completed);

    let first = with_storage(pipeline.storage(), |s| s.get_scan(first_id)).unwrap();
    assert_eq!(first.new_pages, 3);
    // /c is a 404 the first time round
    assert_eq!(first.unchanged_pages, 1);

    server.reset().await;
    mount_page(&server, "/", home).await;
    mount_page(&server, "/a", html("A", "<p>Second version.</p>")).await;
    mount_page(&server, "/b", html("B", "<p>Stable page.</p>")).await;
    mount_page(&server, "/c", html("C", "<p>Brand new.</p>")).await;
    mount_head_ok(&server).await;

    let (second_id, status) = run(&pipeline, &base).await;
    assert_eq!(status, ScanStatus::Completed);

    let pages = pages_of(pipeline.storage(), second_id);
    assert_eq!(page(&pages, &base).change, PageChange::Existing);
    assert_eq!(page(&pages, &format!("{}/a", base)).change, PageChange::Updated);
    assert_eq!(page(&pages, &format!("{}/b", base)).change, PageChange::Existing);
    assert_eq!(page(&pages, &format!("{}/c", base)).change, PageChange::New);

    let second = with_storage(pipeline.storage(), |s| s.get_scan(second_id)).unwrap();
    assert_eq!(second.new_pages, 1);
    assert_eq!(second.updated_pages, 1);
    assert_eq!(second.unchanged_pages, 2);
}

#[tokio::test]
async fn test_sitemap_driven_scan() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html("Home", r#"<a href="/unlisted">Not in the sitemap</a>"#),
    )
    .await;
    mount_page(&server, "/listed", html("Listed", "<p>In the sitemap.</p>")).await;
    mount_page(&server, "/unlisted", html("Unlisted", "<p>Linked only.</p>")).await;
    mount_sitemap(
        &server,
        &[
            format!("{}/", base),
            format!("{}/listed", base),
            "https://elsewhere.example/page".to_string(),
        ],
    )
    .await;
    mount_head_ok(&server).await;

    let (_dir, pipeline) = setup(10, false);
    let (scan_id, status) = run(&pipeline, &format!("{}/sitemap.xml", base)).await;
    assert_eq!(status, ScanStatus::Crawled);

    let pages = pages_of(pipeline.storage(), scan_id);
    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    let listed = format!("{}/listed", base);
    assert_eq!(urls, vec![base.as_str(), listed.as_str()]);
    assert!(pages.iter().all(|p| !p.is_orphan));

    // Links are still checked and recorded, just not followed
    let links = with_storage(pipeline.storage(), |s| s.get_links(scan_id)).unwrap();
    assert_eq!(links.len(), 1);

    // Crawled scans can be analyzed on demand
    let report = pipeline.trigger_analysis(scan_id).expect("analysis failed");
    assert_eq!(report.total_pages, 2);
    assert_eq!(pipeline.scan_status(scan_id).unwrap(), ScanStatus::Completed);
}

#[tokio::test]
async fn test_invalid_settings_fail_the_scan() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html("Home", "<p>Hello.</p>")).await;

    let (_dir, pipeline) = setup(5, true);
    with_storage(pipeline.storage(), |s| s.set_setting("min_readability", "high")).unwrap();

    let (scan_id, status) = run(&pipeline, &server.uri()).await;
    assert_eq!(status, ScanStatus::Failed);
    assert_eq!(pipeline.scan_status(scan_id).unwrap(), ScanStatus::Failed);
    assert!(pages_of(pipeline.storage(), scan_id).is_empty());

    // A failed scan cannot be analyzed
    let result = pipeline.trigger_analysis(scan_id);
    assert!(matches!(
        result,
        Err(AuditError::InvalidTransition {
            from: ScanStatus::Failed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_unreachable_site_still_completes() {
    // Nothing listens on the discard port
    let (_dir, pipeline) = setup(5, true);
    let (scan_id, status) = run(&pipeline, "http://127.0.0.1:9/").await;
    assert_eq!(status, ScanStatus::Completed);

    let pages = pages_of(pipeline.storage(), scan_id);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].status_code, 0);
}
