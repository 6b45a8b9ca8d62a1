//! Markdown report generation
//!
//! Renders a scan and its [`AnalysisReport`] as a human-readable document:
//! run information, an issue overview, then one section per non-empty check.

use crate::analysis::{AnalysisReport, ImageIssue, LinkIssue, PageIssue};
use crate::output::OutputResult;
use crate::storage::ScanRecord;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Rows shown per section before the list is truncated
const MAX_ROWS: usize = 50;

/// Writes the markdown report for a scan to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to create or write the file
pub fn write_markdown_report(
    scan: &ScanRecord,
    report: &AnalysisReport,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(scan, report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a scan report as markdown
pub fn format_markdown_report(scan: &ScanRecord, report: &AnalysisReport) -> String {
    let mut md = String::new();

    md.push_str("# Site Audit Report\n\n");

    // Run metadata
    md.push_str("## Scan Information\n\n");
    md.push_str(&format!("- **Scan ID**: {}\n", scan.id));
    md.push_str(&format!("- **Start URL**: {}\n", scan.start_url));
    md.push_str(&format!("- **Status**: {}\n", scan.status));
    md.push_str(&format!("- **Started**: {}\n", scan.created_at));
    if let Some(finished) = &scan.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    md.push_str(&format!(
        "- **Pages**: {} ({} new, {} updated, {} unchanged)\n\n",
        report.total_pages, scan.new_pages, scan.updated_pages, scan.unchanged_pages
    ));

    md.push_str("## Overview\n\n");
    md.push_str(&format!("**Total issues**: {}\n\n", report.total_issues()));
    md.push_str("| Check | Count |\n");
    md.push_str("|-------|-------|\n");
    for (label, count) in overview_rows(report) {
        md.push_str(&format!("| {} | {} |\n", label, count));
    }
    md.push('\n');

    page_section(&mut md, "Missing Titles", &report.missing_titles);
    page_section(&mut md, "Short Titles", &report.short_titles);
    page_section(&mut md, "Long Titles", &report.long_titles);
    page_section(&mut md, "Missing Descriptions", &report.missing_descriptions);
    page_section(&mut md, "Short Descriptions", &report.short_descriptions);
    page_section(&mut md, "Long Descriptions", &report.long_descriptions);

    duplicate_section(&mut md, "Duplicate Titles", &report.duplicate_titles);
    duplicate_section(&mut md, "Duplicate Descriptions", &report.duplicate_descriptions);
    duplicate_section(&mut md, "Duplicate Content", &report.duplicate_content);

    page_section(&mut md, "Orphaned Pages", &report.orphaned_pages);

    link_section(&mut md, "Broken Links", &report.broken_links);
    link_section(&mut md, "Rate-Limited Links", &report.rate_limited_links);

    image_section(&mut md, "Large Images", &report.large_images);
    image_section(&mut md, "Images Missing Alt Text", &report.missing_alt_images);

    page_section(&mut md, "Thin Content", &report.thin_content);
    page_section(&mut md, "Slow Reads", &report.slow_reads);
    page_section(&mut md, "Low Readability", &report.low_readability);
    page_section(&mut md, "Missing H1", &report.missing_h1);
    page_section(&mut md, "Multiple H1", &report.multiple_h1);
    page_section(&mut md, "Spelling Issues", &report.spelling_issues);
    page_section(&mut md, "Grammar Issues", &report.grammar_issues);

    md.push_str("---\n\n");
    md.push_str("*Report generated by Site-Audit*\n");

    md
}

fn overview_rows(report: &AnalysisReport) -> Vec<(&'static str, usize)> {
    vec![
        ("Broken links", report.broken_links.len()),
        ("Large images", report.large_images.len()),
        ("Images missing alt text", report.missing_alt_images.len()),
        ("Missing titles", report.missing_titles.len()),
        ("Missing descriptions", report.missing_descriptions.len()),
        ("Orphaned pages", report.orphaned_pages.len()),
        ("Thin content", report.thin_content.len()),
        ("Low readability", report.low_readability.len()),
        ("Missing H1", report.missing_h1.len()),
        ("Multiple H1", report.multiple_h1.len()),
        ("Spelling", report.spelling_issues.len()),
        ("Grammar", report.grammar_issues.len()),
    ]
}

fn page_section(md: &mut String, heading: &str, issues: &[PageIssue]) {
    if issues.is_empty() {
        return;
    }

    md.push_str(&format!("## {} ({})\n\n", heading, issues.len()));
    md.push_str("| URL | Detail |\n");
    md.push_str("|-----|--------|\n");
    for issue in issues.iter().take(MAX_ROWS) {
        md.push_str(&format!("| {} | {} |\n", issue.url, escape_cell(&issue.detail)));
    }
    truncation_note(md, issues.len());
}

fn link_section(md: &mut String, heading: &str, links: &[LinkIssue]) {
    if links.is_empty() {
        return;
    }

    md.push_str(&format!("## {} ({})\n\n", heading, links.len()));
    md.push_str("| Source | Target | Anchor | Status |\n");
    md.push_str("|--------|--------|--------|--------|\n");
    for link in links.iter().take(MAX_ROWS) {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            link.source_url,
            link.target_url,
            escape_cell(&link.anchor_text),
            link.status_code
        ));
    }
    truncation_note(md, links.len());
}

fn image_section(md: &mut String, heading: &str, images: &[ImageIssue]) {
    if images.is_empty() {
        return;
    }

    md.push_str(&format!("## {} ({})\n\n", heading, images.len()));
    md.push_str("| Page | Image | Size (KB) |\n");
    md.push_str("|------|-------|-----------|\n");
    for image in images.iter().take(MAX_ROWS) {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            image.page_url, image.image_url, image.file_size_kb
        ));
    }
    truncation_note(md, images.len());
}

fn duplicate_section(md: &mut String, heading: &str, groups: &BTreeMap<String, Vec<String>>) {
    if groups.is_empty() {
        return;
    }

    md.push_str(&format!("## {} ({} groups)\n\n", heading, groups.len()));
    for (key, urls) in groups.iter().take(MAX_ROWS) {
        md.push_str(&format!("- **{}** ({} pages)\n", escape_cell(key), urls.len()));
        for url in urls {
            md.push_str(&format!("  - {}\n", url));
        }
    }
    truncation_note(md, groups.len());
}

fn truncation_note(md: &mut String, total: usize) {
    if total > MAX_ROWS {
        md.push_str(&format!("\n... and {} more\n\n", total - MAX_ROWS));
    } else {
        md.push('\n');
    }
}

/// Keeps table cells on one line and stops pipes from splitting them
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
