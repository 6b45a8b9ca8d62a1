//! Mechanical grammar checks
//!
//! Three pattern checks over adjacent words: "a" before a vowel, "an"
//! before a consonant, and an immediately repeated word. Each match keeps
//! up to 50 characters of context on either side.

use crate::analysis::spelling::{CheckOutcome, TextChecker, MAX_EXAMPLES};
use regex::Regex;
use std::sync::LazyLock;

/// Characters of context kept on each side of a match
const CONTEXT_CHARS: usize = 50;

#[allow(clippy::expect_used)]
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)?").expect("hardcoded regex pattern is valid"));

/// Which rule a match broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarRule {
    /// "a" followed by a vowel-initial word
    ArticleA,
    /// "an" followed by a consonant-initial word
    ArticleAn,
    /// The same word twice in a row
    RepeatedWord,
}

/// One grammar finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarMatch {
    pub rule: GrammarRule,
    /// Byte offset of the first word of the pair
    pub position: usize,
    pub context: String,
}

/// Local, rule-based grammar checker
#[derive(Debug, Clone, Copy, Default)]
pub struct GrammarChecker;

impl GrammarChecker {
    /// Returns every match in text order
    pub fn find_matches(&self, text: &str) -> Vec<GrammarMatch> {
        let words: Vec<_> = WORD.find_iter(text).collect();
        let mut matches = Vec::new();

        for pair in words.windows(2) {
            let (first, second) = (pair[0], pair[1]);

            // Only words separated by plain whitespace are adjacent
            if !text[first.end()..second.start()]
                .chars()
                .all(char::is_whitespace)
            {
                continue;
            }

            let lead = first.as_str();
            let next = second.as_str();
            let starts_with_vowel = next
                .chars()
                .next()
                .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'));

            let mut record = |rule| {
                matches.push(GrammarMatch {
                    rule,
                    position: first.start(),
                    context: context_around(text, first.start(), second.end()),
                })
            };

            if lead.eq_ignore_ascii_case("a") && starts_with_vowel {
                record(GrammarRule::ArticleA);
            } else if lead.eq_ignore_ascii_case("an") && !starts_with_vowel {
                record(GrammarRule::ArticleAn);
            }

            if lead.eq_ignore_ascii_case(next) {
                record(GrammarRule::RepeatedWord);
            }
        }

        matches
    }
}

impl TextChecker for GrammarChecker {
    fn check(&self, text: &str) -> CheckOutcome {
        let matches = self.find_matches(text);

        CheckOutcome {
            issue_count: matches.len() as u32,
            examples: matches
                .into_iter()
                .take(MAX_EXAMPLES)
                .map(|m| m.context)
                .collect(),
        }
    }
}

/// Slices `CONTEXT_CHARS` characters either side of `start..end`
fn context_around(text: &str, start: usize, end: usize) -> String {
    let before = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map_or(0, |(i, _)| i);

    let after = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(text.len(), |(i, _)| end + i);

    text[before..after].trim().to_string()
}
