//! Text normalization and word-frequency ranking.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

/// Number of entries returned by [`rank_words`].
pub const TOP_WORDS_LIMIT: usize = 5;

/// Tokens of this many characters or fewer are dropped when stopwords are excluded.
const MIN_TOKEN_CHARS: usize = 2;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

// Common English function words, excluded from frequency ranking
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "a", "an", "the", "and", "or", "but", "if", "then", "else", "of", "to", "in", "on",
        "at", "by", "for", "with", "about", "against", "between", "into", "through", "during",
        "before", "after", "above", "below", "from", "up", "down", "out", "off", "over",
        "under", "again", "further", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "can", "will",
        "just", "should", "now", "is", "are", "was", "were", "be", "been", "being", "have",
        "has", "had", "having", "do", "does", "did", "doing", "would", "could", "this",
        "that", "these", "those", "am", "i", "me", "my", "myself", "we", "our", "ours",
        "you", "your", "yours", "he", "him", "his", "she", "her", "hers", "it", "its",
        "they", "them", "their", "theirs", "what", "which", "who", "whom", "also", "as",
        "while", "until", "because", "still", "even", "much", "many", "us",
    ]
    .into_iter()
    .collect()
});

/// A word and how many times it occurs in one analyzed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WordFrequency {
    #[schema(example = "python")]
    pub word: String,
    #[schema(example = 3)]
    pub frequency: usize,
}

/// Lowercases, replaces every non-word character with a space, collapses
/// whitespace runs and trims. Total and idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Number of tokens in the normalized text.
pub fn word_count(text: &str) -> usize {
    normalize(text).split_whitespace().count()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Returns up to [`TOP_WORDS_LIMIT`] words by descending frequency.
/// Equal counts keep first-occurrence order.
pub fn rank_words(text: &str, exclude_stopwords: bool) -> Vec<WordFrequency> {
    let normalized = normalize(text);

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for token in normalized.split_whitespace() {
        if exclude_stopwords && (is_stopword(token) || token.chars().count() <= MIN_TOKEN_CHARS) {
            continue;
        }
        match index.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // sort_by is stable, so ties stay in first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(TOP_WORDS_LIMIT)
        .map(|(word, frequency)| WordFrequency {
            word: word.to_string(),
            frequency,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wf(word: &str, frequency: usize) -> WordFrequency {
        WordFrequency {
            word: word.to_string(),
            frequency,
        }
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Hello, World!  How's it\tgoing?"), "hello world how s it going");
        assert_eq!(normalize("snake_case stays"), "snake_case stays");
        assert_eq!(normalize("Ação É ótima"), "ação é ótima");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   ...!!! "), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("One, two... three!"), 3);
        assert_eq!(word_count("  "), 0);
    }

    #[test]
    fn test_rank_scenario() {
        let ranked = rank_words("python python java python javascript java", true);
        assert_eq!(ranked, vec![wf("python", 3), wf("java", 2), wf("javascript", 1)]);
    }

    #[test]
    fn test_rank_ties_keep_first_occurrence() {
        let ranked = rank_words("zebra apple mango apple zebra mango", true);
        assert_eq!(ranked, vec![wf("zebra", 2), wf("apple", 2), wf("mango", 2)]);
    }

    #[test]
    fn test_rank_drops_stopwords_and_short_tokens() {
        let ranked = rank_words("The cat and the dog is on a big rug with the cat", true);
        assert_eq!(ranked, vec![wf("cat", 2), wf("dog", 1), wf("big", 1), wf("rug", 1)]);
    }

    #[test]
    fn test_rank_keeps_everything_without_exclusion() {
        let ranked = rank_words("the the a", false);
        assert_eq!(ranked, vec![wf("the", 2), wf("a", 1)]);
    }

    #[test]
    fn test_rank_limits_to_five() {
        let ranked = rank_words("alpha bravo charlie delta echo foxtrot golf", true);
        assert_eq!(ranked.len(), TOP_WORDS_LIMIT);
        assert_eq!(ranked[0].word, "alpha");
        assert_eq!(ranked[4].word, "echo");
    }

    #[test]
    fn test_rank_empty_inputs() {
        assert!(rank_words("", true).is_empty());
        assert!(rank_words("the and of to is", true).is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(s in "[a-zA-Z0-9 _,.;:!?'\"()\\-\t\néÉçÇãÃ]{0,120}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_rank_bounded(s in "[a-z ]{0,200}", exclude in any::<bool>()) {
            let ranked = rank_words(&s, exclude);
            prop_assert!(ranked.len() <= TOP_WORDS_LIMIT);
            prop_assert!(ranked.iter().all(|w| w.frequency >= 1));
            prop_assert!(ranked.windows(2).all(|w| w[0].frequency >= w[1].frequency));
        }
    }
}
