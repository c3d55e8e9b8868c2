//! Keyword-based sentiment scoring.
//!
//! Classifies text as positive, negative or neutral from two fixed word
//! lists plus a handful of negative phrases. No external dependencies, so it
//! doubles as the fallback whenever the AI provider is unavailable.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use utoipa::ToSchema;

use crate::text::normalize;

/// Confidence reported for a neutral verdict.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 0.85;
const CONFIDENCE_STEP: f64 = 0.1;
/// Added to the negative count when any negative phrase matches.
const PATTERN_BONUS: usize = 2;

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "good", "great", "excellent", "amazing", "wonderful", "fantastic", "superb",
        "outstanding", "brilliant", "love", "loved", "loving", "best", "better",
        "positive", "happy", "joy", "joyful", "beautiful", "perfect", "awesome",
        "incredible", "magnificent", "delightful", "pleasant", "satisfying", "satisfied",
        "recommend", "recommended", "impressive", "exceptional", "remarkable", "success",
        "successful", "win", "winner", "winning", "efficient", "effective", "helpful",
        "reliable", "glad", "pleased", "enjoy", "enjoyed", "nice", "valuable", "favorable",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "bad", "terrible", "awful", "horrible", "poor", "worst", "worse", "hate",
        "hated", "dislike", "disappointing", "disappointed", "failure", "failed", "fail",
        "failing", "negative", "sad", "unhappy", "angry", "annoyed", "frustrated",
        "frustrating", "problem", "problems", "issue", "issues", "bug", "bugs", "broken",
        "crash", "crashed", "error", "errors", "mistake", "wrong", "useless", "waste",
        "unreliable", "unstable", "slow", "difficult", "complicated", "confusing",
        "impossible", "unfortunately", "defect", "depressed", "upset", "pathetic",
    ]
    .into_iter()
    .collect()
});

// Matched against normalized text, so apostrophes have already become spaces
const NEGATIVE_PATTERNS: &[&str] = &[
    "does not work",
    "doesn t work",
    "not working",
    "full of problems",
    "full of bugs",
    "full of errors",
    "too many problems",
    "too many bugs",
    "waste of time",
    "waste of money",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Parses a label case-insensitively. Returns `None` for anything else.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment verdict with optional confidence in `[0, 1]` and explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 0.7)]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl SentimentResult {
    pub fn new(sentiment: Sentiment, confidence: f64, explanation: impl Into<String>) -> Self {
        Self {
            sentiment,
            confidence: Some(confidence),
            explanation: Some(explanation.into()),
        }
    }
}

/// Lexicon hits found in one text.
#[derive(Debug, Default)]
struct Evidence {
    positive: Vec<String>,
    negative: Vec<String>,
    patterns: Vec<&'static str>,
}

impl Evidence {
    fn collect(text: &str) -> Self {
        let normalized = normalize(text);

        let mut seen = HashSet::new();
        let mut evidence = Evidence::default();
        for token in normalized.split_whitespace() {
            if !seen.insert(token) {
                continue;
            }
            if POSITIVE_WORDS.contains(token) {
                evidence.positive.push(token.to_string());
            } else if NEGATIVE_WORDS.contains(token) {
                evidence.negative.push(token.to_string());
            }
        }

        evidence.patterns = NEGATIVE_PATTERNS
            .iter()
            .copied()
            .filter(|p| normalized.contains(p))
            .collect();

        evidence
    }

    fn positive_count(&self) -> usize {
        self.positive.len()
    }

    fn negative_count(&self) -> usize {
        let bonus = if self.patterns.is_empty() { 0 } else { PATTERN_BONUS };
        self.negative.len() + bonus
    }
}

fn confidence_for(diff: usize) -> f64 {
    (NEUTRAL_CONFIDENCE + CONFIDENCE_STEP * diff as f64).min(MAX_CONFIDENCE)
}

fn quoted(words: &[String], limit: usize) -> String {
    words.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
}

/// Scores text with the local lexicon. Pure and deterministic.
pub fn score(text: &str) -> SentimentResult {
    let evidence = Evidence::collect(text);
    let positive = evidence.positive_count();
    let negative = evidence.negative_count();

    if positive > negative {
        let explanation = if evidence.positive.is_empty() {
            "Analysis indicates a positive tone based on the overall context".to_string()
        } else {
            format!(
                "Text contains positive words such as '{}', indicating a favorable sentiment",
                quoted(&evidence.positive, 3)
            )
        };
        SentimentResult::new(Sentiment::Positive, confidence_for(positive - negative), explanation)
    } else if negative > positive {
        let explanation = match (evidence.patterns.first(), evidence.negative.is_empty()) {
            (Some(pattern), false) => format!(
                "Text expresses frustration with phrases like '{}' and negative words such as '{}'",
                pattern,
                quoted(&evidence.negative, 2)
            ),
            (Some(pattern), true) => format!("Detected negative expression: '{}'", pattern),
            (None, false) => format!(
                "Presence of negative words: '{}'",
                quoted(&evidence.negative, 3)
            ),
            (None, true) => "Analysis indicates a negative tone based on the overall context".to_string(),
        };
        SentimentResult::new(Sentiment::Negative, confidence_for(negative - positive), explanation)
    } else {
        SentimentResult::new(
            Sentiment::Neutral,
            NEUTRAL_CONFIDENCE,
            "Text has no clearly positive or negative words, keeping a neutral tone",
        )
    }
}
