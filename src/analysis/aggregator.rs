//! Issue aggregation and the analysis pass

use crate::analysis::content::analyze_page;
use crate::analysis::grammar::GrammarChecker;
use crate::analysis::report::{AnalysisReport, ImageIssue, LinkIssue, PageIssue};
use crate::analysis::spelling::{SpellChecker, TextChecker};
use crate::config::ScanSettings;
use crate::crawler::parse_html;
use crate::state::ScanStatus;
use crate::storage::{
    transition_scan, with_storage, ImageRecord, LinkRecord, PageMetrics, PageRecord,
    SharedStorage, Storage,
};
use crate::url::domain_of;
use crate::AuditError;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use url::Url;

/// Readability is only judged on pages longer than this
const READABILITY_MIN_WORDS: u32 = 50;

/// Builds the issue report from a scan's rows
pub fn aggregate(
    pages: &[PageRecord],
    links: &[LinkRecord],
    images: &[ImageRecord],
    settings: &ScanSettings,
) -> AnalysisReport {
    let mut report = AnalysisReport {
        total_pages: pages.len(),
        ..Default::default()
    };

    let mut titles: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut descriptions: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut hashes: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for page in pages {
        if page.is_orphan {
            report
                .orphaned_pages
                .push(PageIssue::new(&page.url, format!("status {}", page.status_code)));
        }

        if !page.is_content_page() {
            continue;
        }

        check_title(page, settings, &mut report);
        check_description(page, settings, &mut report);
        check_content(page, settings, &mut report);

        let title = page.title.trim();
        if !title.is_empty() {
            titles.entry(title.to_string()).or_default().push(page.url.clone());
        }

        let description = page.meta_description.trim();
        if !description.is_empty() {
            descriptions
                .entry(description.to_string())
                .or_default()
                .push(page.url.clone());
        }

        if let Some(hash) = page.content_hash.as_deref() {
            hashes.entry(hash.to_string()).or_default().push(page.url.clone());
        }
    }

    report.duplicate_titles = only_duplicates(titles);
    report.duplicate_descriptions = only_duplicates(descriptions);
    report.duplicate_content = only_duplicates(hashes);

    for link in links {
        if link.status_code == 429 {
            report.rate_limited_links.push(link_issue(link));
        } else if link.is_broken {
            report.broken_links.push(link_issue(link));
        }
    }

    for image in images {
        if image.is_large {
            report.large_images.push(image_issue(image));
        }
        if image.missing_alt {
            report.missing_alt_images.push(image_issue(image));
        }
    }

    report
}

fn check_title(page: &PageRecord, settings: &ScanSettings, report: &mut AnalysisReport) {
    let title = page.title.trim();
    let len = title.chars().count();

    if len == 0 {
        report.missing_titles.push(PageIssue::new(&page.url, ""));
    } else if len < settings.min_title_length {
        report
            .short_titles
            .push(PageIssue::new(&page.url, format!("{} ({} chars)", title, len)));
    } else if len > settings.max_title_length {
        report
            .long_titles
            .push(PageIssue::new(&page.url, format!("{} ({} chars)", title, len)));
    }
}

fn check_description(page: &PageRecord, settings: &ScanSettings, report: &mut AnalysisReport) {
    let description = page.meta_description.trim();
    let len = description.chars().count();

    if len == 0 {
        report.missing_descriptions.push(PageIssue::new(&page.url, ""));
    } else if len < settings.min_desc_length {
        report
            .short_descriptions
            .push(PageIssue::new(&page.url, format!("{} chars", len)));
    } else if len > settings.max_desc_length {
        report
            .long_descriptions
            .push(PageIssue::new(&page.url, format!("{} chars", len)));
    }
}

fn check_content(page: &PageRecord, settings: &ScanSettings, report: &mut AnalysisReport) {
    let m = &page.metrics;

    if (m.word_count as usize) < settings.thin_content_words {
        report
            .thin_content
            .push(PageIssue::new(&page.url, format!("{} words", m.word_count)));
    }

    if m.reading_time > settings.max_reading_minutes {
        report
            .slow_reads
            .push(PageIssue::new(&page.url, format!("{:.1} min", m.reading_time)));
    }

    if m.word_count > READABILITY_MIN_WORDS && m.readability < settings.min_readability {
        report
            .low_readability
            .push(PageIssue::new(&page.url, format!("score {:.1}", m.readability)));
    }

    match m.h1_count {
        0 => report.missing_h1.push(PageIssue::new(&page.url, "")),
        1 => {}
        n => report
            .multiple_h1
            .push(PageIssue::new(&page.url, format!("{} h1 elements", n))),
    }

    if m.spelling_issues > 0 {
        report.spelling_issues.push(PageIssue::new(
            &page.url,
            format!("{} ({})", m.spelling_issues, m.spelling_examples.join(", ")),
        ));
    }

    if m.grammar_issues > 0 {
        report
            .grammar_issues
            .push(PageIssue::new(&page.url, m.grammar_issues.to_string()));
    }
}

fn only_duplicates(groups: BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    groups.into_iter().filter(|(_, urls)| urls.len() > 1).collect()
}

fn link_issue(link: &LinkRecord) -> LinkIssue {
    LinkIssue {
        source_url: link.source_url.clone(),
        target_url: link.target_url.clone(),
        anchor_text: link.anchor_text.clone(),
        status_code: link.status_code,
    }
}

fn image_issue(image: &ImageRecord) -> ImageIssue {
    ImageIssue {
        page_url: image.page_url.clone(),
        image_url: image.image_url.clone(),
        alt_text: image.alt_text.clone(),
        file_size_kb: image.file_size_kb,
    }
}

/// Computes per-page metrics from stored HTML
///
/// Returns `None` for pages without a body or with an unparsable URL.
pub fn page_metrics(page: &PageRecord, domain: &str) -> Option<PageMetrics> {
    let html = page.html.as_deref()?;
    let base = match Url::parse(&page.url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Skipping analysis of {}: {}", page.url, e);
            return None;
        }
    };

    let parsed = parse_html(html, &base, domain);
    let content = analyze_page(&parsed, domain);
    let spelling = SpellChecker.check(&parsed.text);
    let grammar = GrammarChecker.check(&parsed.text);

    Some(PageMetrics {
        word_count: content.word_count,
        reading_time: content.reading_time,
        readability: content.readability,
        h1_count: content.h1_count,
        internal_links: content.internal_links,
        external_links: content.external_links,
        top_keywords: content.top_keywords,
        spelling_issues: spelling.issue_count,
        spelling_examples: spelling.examples,
        grammar_issues: grammar.issue_count,
        grammar_examples: grammar.examples,
    })
}

/// Runs the analysis pass over a crawled scan
///
/// The scan moves to `analyzing`, every stored page gets fresh metrics, and
/// the aggregated report is written back before the scan moves to
/// `completed`. Running it again on a completed scan yields the same report.
/// On error the scan is left in `analyzing`; the caller decides whether to
/// mark it failed.
pub fn analyze_scan(storage: &SharedStorage, scan_id: i64) -> Result<AnalysisReport, AuditError> {
    transition_scan(storage, scan_id, ScanStatus::Analyzing)?;

    let (scan, settings_map, pages) = with_storage(storage, |s| {
        Ok((s.get_scan(scan_id)?, s.load_settings()?, s.get_pages(scan_id)?))
    })?;
    let settings = ScanSettings::from_map(&settings_map)?;

    info!("Analyzing scan {} ({} pages)", scan_id, pages.len());

    let fallback_domain = domain_of(&scan.start_url).unwrap_or_default();
    let mut updates = Vec::new();

    for page in &pages {
        let domain = domain_of(&page.url).unwrap_or_else(|| fallback_domain.clone());
        if let Some(metrics) = page_metrics(page, &domain) {
            debug!(
                "{}: {} words, readability {}",
                page.url, metrics.word_count, metrics.readability
            );
            updates.push((page.url.clone(), metrics));
        }
    }

    let (pages, links, images) = with_storage(storage, |s| {
        for (url, metrics) in &updates {
            s.update_page_metrics(scan_id, url, metrics)?;
        }
        Ok((s.get_pages(scan_id)?, s.get_links(scan_id)?, s.get_images(scan_id)?))
    })?;

    let report = aggregate(&pages, &links, &images, &settings);
    let total_issues = report.total_issues();
    let json = report.to_json()?;

    with_storage(storage, |s| s.set_scan_report(scan_id, &json, total_issues as u32))?;
    transition_scan(storage, scan_id, ScanStatus::Completed)?;

    info!(
        "Scan {} analyzed: {} issues across {} pages",
        scan_id, total_issues, report.total_pages
    );

    Ok(report)
}
