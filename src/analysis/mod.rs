//! Content analysis for crawled pages
//!
//! Per-page metrics (word counts, readability, keywords), the local spelling
//! and grammar checkers, and the aggregation of everything into an
//! [`AnalysisReport`].

mod aggregator;
mod content;
mod grammar;
mod keywords;
mod report;
mod spelling;

pub use aggregator::{aggregate, analyze_scan, page_metrics};
pub use content::{analyze_content, analyze_page, ContentMetrics};
pub use grammar::{GrammarChecker, GrammarMatch, GrammarRule};
pub use keywords::{is_stop_word, top_keywords};
pub use report::{AnalysisReport, ImageIssue, LinkIssue, PageIssue};
pub use spelling::{CheckOutcome, SpellChecker, TextChecker, MAX_EXAMPLES};
