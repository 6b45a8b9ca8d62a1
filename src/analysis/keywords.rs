//! Keyword extraction
//!
//! Frequency ranking over lowercase alphabetic tokens, minus stop words.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static KEYWORD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,}\b").expect("hardcoded regex pattern is valid"));

const STOP_WORD_LIST: &str = "
    about above after again against all also among and any are aren because been before
    being below between both but can cannot could couldn did didn does doesn doing don down
    during each even ever every few for from further get gets got had hadn has hasn have
    haven having her here hers herself him himself his how however into isn its itself just
    let like made make many may might more most much must mustn myself nor not now off
    once one only other our ours ourselves out over own per same shall she should shouldn
    since some such than that the their theirs them themselves then there these they this
    those through too under until upon use used using very via was wasn way well were
    weren what when where whether which while who whom whose why will with within without
    won would wouldn yet you your yours yourself yourselves
";

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORD_LIST.split_whitespace().collect());

/// Returns true if `word` (lowercase) is a stop word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Returns the `limit` most frequent non-stop-word tokens joined with ", "
///
/// Tokens are runs of three or more ASCII letters on word boundaries, taken
/// from the lowercased text. Ties keep first-occurrence order.
pub fn top_keywords(text: &str, limit: usize) -> String {
    let lowered = text.to_lowercase();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for token in KEYWORD_TOKEN.find_iter(&lowered).map(|m| m.as_str()) {
        if is_stop_word(token) {
            continue;
        }
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    // Stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(limit);
    order.join(", ")
}
