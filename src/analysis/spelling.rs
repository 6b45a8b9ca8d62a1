//! Spelling check against an embedded English word list
//!
//! The list holds base forms; common inflections are recognised by
//! stripping suffixes before lookup. Three-letter entries exist only so
//! that words like "boxes" and "running" resolve to a stem.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Result of running a [`TextChecker`] over a page's text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    pub issue_count: u32,
    /// At most [`MAX_EXAMPLES`] examples, in text order
    pub examples: Vec<String>,
}

/// Number of examples kept per check
pub const MAX_EXAMPLES: usize = 5;

/// A text-quality check
///
/// Implementations must be deterministic for a given text. A remote
/// (model-backed) checker would implement this same trait.
pub trait TextChecker: Send + Sync {
    fn check(&self, text: &str) -> CheckOutcome;
}

static DICTIONARY: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| include_str!("dictionary.txt").lines().map(str::trim).collect());

/// Dictionary-backed spell checker
#[derive(Debug, Clone, Copy, Default)]
pub struct SpellChecker;

impl SpellChecker {
    /// Shortest token that is checked
    pub const MIN_WORD_LEN: usize = 4;

    /// Returns true if `word` (lowercase) or a simple stem of it is known
    pub fn is_known(word: &str) -> bool {
        DICTIONARY.contains(word) || stems(word).iter().any(|s| DICTIONARY.contains(s.as_str()))
    }
}

impl TextChecker for SpellChecker {
    /// Counts distinct unknown words; examples are the first five by position
    fn check(&self, text: &str) -> CheckOutcome {
        let mut seen = HashSet::new();
        let mut unknown = Vec::new();

        let tokens = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|t| t.chars().count() >= Self::MIN_WORD_LEN)
            .map(str::to_lowercase);

        for token in tokens {
            if seen.insert(token.clone()) && !Self::is_known(&token) {
                unknown.push(token);
            }
        }

        CheckOutcome {
            issue_count: unknown.len() as u32,
            examples: unknown.into_iter().take(MAX_EXAMPLES).collect(),
        }
    }
}

/// Candidate base forms for an inflected word
///
/// Handles `s`, `es`, `ed`, `ing`, `ly`, `er` and `est`, restoring a
/// dropped `e` ("making" -> "make"), a `y` turned into `i` ("cities" ->
/// "city") and a doubled final consonant ("stopped" -> "stop").
fn stems(word: &str) -> Vec<String> {
    const SUFFIXES: &[&str] = &["ing", "est", "es", "ed", "ly", "er", "s"];

    let mut candidates = Vec::new();

    for suffix in SUFFIXES {
        let Some(base) = word.strip_suffix(suffix) else {
            continue;
        };
        if base.len() < 2 {
            continue;
        }

        candidates.push(base.to_string());
        candidates.push(format!("{}e", base));

        if let Some(stem) = base.strip_suffix('i') {
            candidates.push(format!("{}y", stem));
        }

        let mut tail = base.char_indices().rev();
        if let (Some((last_at, last)), Some((_, prev))) = (tail.next(), tail.next()) {
            if last == prev {
                candidates.push(base[..last_at].to_string());
            }
        }
    }

    candidates
}
