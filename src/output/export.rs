//! Page exports in CSV and JSON

use crate::output::OutputResult;
use crate::storage::PageRecord;
use serde::Serialize;
use std::io::Write;

const CSV_HEADERS: [&str; 15] = [
    "URL",
    "Status Code",
    "Title",
    "Meta Description",
    "Word Count",
    "Reading Time",
    "Readability",
    "H1 Count",
    "Internal Links",
    "External Links",
    "Spelling Issues",
    "Grammar Issues",
    "Top Keywords",
    "Is Orphan",
    "Incoming Links",
];

/// One exported page, in column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageExport {
    pub url: String,
    pub status_code: u16,
    pub title: String,
    pub meta_description: String,
    pub word_count: u32,
    pub reading_time: f64,
    pub readability: f64,
    pub h1_count: u32,
    pub internal_links: u32,
    pub external_links: u32,
    pub spelling_issues: u32,
    pub grammar_issues: u32,
    pub top_keywords: String,
    pub is_orphan: bool,
    pub incoming_links: u32,
}

impl From<&PageRecord> for PageExport {
    fn from(page: &PageRecord) -> Self {
        let m = &page.metrics;
        Self {
            url: page.url.clone(),
            status_code: page.status_code,
            title: page.title.clone(),
            meta_description: page.meta_description.clone(),
            word_count: m.word_count,
            reading_time: m.reading_time,
            readability: m.readability,
            h1_count: m.h1_count,
            internal_links: m.internal_links,
            external_links: m.external_links,
            spelling_issues: m.spelling_issues,
            grammar_issues: m.grammar_issues,
            top_keywords: m.top_keywords.clone(),
            is_orphan: page.is_orphan,
            incoming_links: page.incoming_links,
        }
    }
}

/// Writes one CSV row per page, with a header row
pub fn export_csv<W: Write>(pages: &[PageRecord], writer: W) -> OutputResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADERS)?;

    for rec in pages.iter().map(PageExport::from) {
        writer.write_record([
            rec.url,
            rec.status_code.to_string(),
            rec.title,
            rec.meta_description,
            rec.word_count.to_string(),
            rec.reading_time.to_string(),
            rec.readability.to_string(),
            rec.h1_count.to_string(),
            rec.internal_links.to_string(),
            rec.external_links.to_string(),
            rec.spelling_issues.to_string(),
            rec.grammar_issues.to_string(),
            rec.top_keywords,
            rec.is_orphan.to_string(),
            rec.incoming_links.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the pages as a pretty-printed JSON array
pub fn export_json<W: Write>(pages: &[PageRecord], mut writer: W) -> OutputResult<()> {
    let records: Vec<PageExport> = pages.iter().map(PageExport::from).collect();
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PageMetrics;

    fn pages() -> Vec<PageRecord> {
        vec![
            PageRecord {
                url: "https://example.com".to_string(),
                status_code: 200,
                title: "Home, sweet home".to_string(),
                incoming_links: 2,
                metrics: PageMetrics {
                    word_count: 320,
                    reading_time: 1.6,
                    readability: 61.2,
                    h1_count: 1,
                    top_keywords: "garden, tools".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
            PageRecord {
                url: "https://example.com/orphan".to_string(),
                status_code: 404,
                is_orphan: true,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut out = Vec::new();
        export_csv(&pages(), &mut out).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 15);
        assert_eq!(&headers[0], "URL");
        assert_eq!(&headers[14], "Incoming Links");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        // embedded comma survives quoting
        assert_eq!(&rows[0][2], "Home, sweet home");
        assert_eq!(&rows[0][12], "garden, tools");
        assert_eq!(&rows[1][1], "404");
        assert_eq!(&rows[1][13], "true");
    }

    #[test]
    fn test_json_array() {
        let mut out = Vec::new();
        export_json(&pages(), &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["word_count"], 320);
        assert_eq!(items[0]["incoming_links"], 2);
        assert_eq!(items[1]["is_orphan"], true);
    }

    #[test]
    fn test_empty_export() {
        let mut out = Vec::new();
        export_json(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
    }
}
