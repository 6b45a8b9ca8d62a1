//! Per-page content metrics
//!
//! Everything here is a pure function of the extracted page, so the
//! analysis pass can be re-run at any time and produce the same numbers.

use crate::analysis::keywords::top_keywords;
use crate::crawler::{ExtractedLink, ParsedPage};
use crate::url::domain_of;

/// Average adult reading speed, words per minute
const WORDS_PER_MINUTE: f64 = 200.0;

/// Derived metrics for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentMetrics {
    pub word_count: u32,
    /// Minutes, one decimal
    pub reading_time: f64,
    /// Flesch reading ease, one decimal; 0 for very short texts
    pub readability: f64,
    pub h1_count: u32,
    pub internal_links: u32,
    pub external_links: u32,
    /// Up to five keywords joined with ", "
    pub top_keywords: String,
}

/// Analyzes a parsed page, taking the H1 count from the extractor
pub fn analyze_page(page: &ParsedPage, domain: &str) -> ContentMetrics {
    ContentMetrics {
        h1_count: page.h1_count,
        ..analyze_content(&page.text, &page.links, domain)
    }
}

/// Derives word, readability, link and keyword metrics from visible text
///
/// `h1_count` is left at 0; see [`analyze_page`].
pub fn analyze_content(text: &str, links: &[ExtractedLink], domain: &str) -> ContentMetrics {
    let word_count = text.split_whitespace().count();

    let readability = if word_count > 5 {
        round1(flesch_reading_ease(text, word_count))
    } else {
        0.0
    };

    let internal_links = links
        .iter()
        .filter(|link| is_internal_link(link, domain))
        .count();

    ContentMetrics {
        word_count: word_count as u32,
        reading_time: round1(word_count as f64 / WORDS_PER_MINUTE),
        readability,
        h1_count: 0,
        internal_links: internal_links as u32,
        external_links: (links.len() - internal_links) as u32,
        top_keywords: top_keywords(text, 5),
    }
}

/// A link is internal if its href is root-relative or it resolves into `domain`
fn is_internal_link(link: &ExtractedLink, domain: &str) -> bool {
    (link.href.starts_with('/') && !link.href.starts_with("//"))
        || domain_of(&link.url).is_some_and(|d| d == domain)
}

/// `206.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)`
fn flesch_reading_ease(text: &str, word_count: usize) -> f64 {
    let sentences = count_sentences(text).max(1) as f64;
    let syllables: usize = text.split_whitespace().map(count_syllables).sum();
    let words = word_count as f64;

    206.835 - 1.015 * (words / sentences) - 84.6 * (syllables as f64 / words)
}

/// Counts runs of sentence terminators (`.`, `!`, `?`)
fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut in_run = false;

    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if !in_run {
                count += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }

    count
}

/// Vowel-group syllable estimate with a silent trailing `e`; at least 1
pub(crate) fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    // "make", "code": the final e is silent, but "the" and "be" keep theirs
    if count > 1 && letters.last() == Some(&'e') && !letters.ends_with(&['l', 'e']) {
        count -= 1;
    }

    count.max(1)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
