//! In-memory analysis store with bounded retention and term search.
//!
//! Records are keyed by a fingerprint of their original text, so submitting
//! the same text twice replaces the earlier record instead of adding a second
//! one. The store keeps at most `capacity` records and evicts the oldest
//! first. Nothing survives a restart.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use utoipa::ToSchema;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::AnalysisError;
use crate::sentiment::SentimentResult;
use crate::text::{normalize, WordFrequency};

pub const DEFAULT_STORE_CAPACITY: usize = 100;

/// Deterministic key for a text: xxh3-64 of its bytes as 16 hex digits.
///
/// Two different texts can collide; the later one then overwrites the
/// earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Fingerprint(format!("{:016x}", xxh3_64(text.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One completed analysis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub fingerprint: Fingerprint,
    pub original_text: String,
    pub word_count: usize,
    pub top_words: Vec<WordFrequency>,
    pub sentiment: SentimentResult,
    pub timestamp: String,
}

impl AnalysisRecord {
    pub fn new(
        original_text: String,
        word_count: usize,
        top_words: Vec<WordFrequency>,
        sentiment: SentimentResult,
        timestamp: String,
    ) -> Self {
        Self {
            fingerprint: Fingerprint::of(&original_text),
            original_text,
            word_count,
            top_words,
            sentiment,
            timestamp,
        }
    }
}

/// Outcome of a term search over every stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    #[schema(example = "python")]
    pub term: String,
    pub found: bool,
    pub occurrences: usize,
    /// Timestamp of the newest record containing the term.
    #[serde(rename = "last_analysis_timestamp")]
    pub last_timestamp: Option<String>,
}

struct StoredAnalysis {
    record: AnalysisRecord,
    // cached so searches don't renormalize every record
    normalized: String,
}

#[derive(Default)]
struct StoreInner {
    entries: HashMap<Fingerprint, StoredAnalysis>,
    // oldest first; each fingerprint appears at most once
    history: VecDeque<Fingerprint>,
}

pub struct AnalysisStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CAPACITY)
    }
}

impl AnalysisStore {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner>, AnalysisError> {
        self.inner
            .read()
            .map_err(|_| AnalysisError::Internal("analysis store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>, AnalysisError> {
        self.inner
            .write()
            .map_err(|_| AnalysisError::Internal("analysis store lock poisoned".to_string()))
    }

    /// Inserts or replaces the record under its own fingerprint, then evicts
    /// the oldest records while over capacity. Build records with
    /// [`AnalysisRecord::new`] so the fingerprint matches the text.
    pub fn record(&self, record: AnalysisRecord) -> Result<(), AnalysisError> {
        debug_assert_eq!(
            record.fingerprint,
            Fingerprint::of(&record.original_text),
            "fingerprint does not match the record's text"
        );
        let fingerprint = record.fingerprint.clone();
        let normalized = normalize(&record.original_text);

        let mut inner = self.write()?;
        if inner.entries.contains_key(&fingerprint) {
            inner.history.retain(|f| f != &fingerprint);
        }
        inner.history.push_back(fingerprint.clone());
        inner
            .entries
            .insert(fingerprint, StoredAnalysis { record, normalized });

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.history.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            debug!("Evicted analysis {} (capacity {})", oldest, self.capacity);
        }

        Ok(())
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AnalysisRecord>, AnalysisError> {
        Ok(self.read()?.entries.get(fingerprint).map(|s| s.record.clone()))
    }

    pub fn len(&self) -> Result<usize, AnalysisError> {
        Ok(self.read()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, AnalysisError> {
        Ok(self.len()? == 0)
    }

    /// Counts occurrences of `term` (lowercased, trimmed) across the
    /// normalized text of every stored record.
    pub fn search(&self, term: &str) -> Result<SearchResult, AnalysisError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Err(AnalysisError::InvalidArgument(
                "search term must not be empty".to_string(),
            ));
        }

        let inner = self.read()?;
        let mut occurrences = 0;
        let mut last_timestamp: Option<&str> = None;

        for stored in inner.entries.values() {
            let count = stored.normalized.matches(needle.as_str()).count();
            if count == 0 {
                continue;
            }
            occurrences += count;
            let ts = stored.record.timestamp.as_str();
            if last_timestamp.map_or(true, |last| ts > last) {
                last_timestamp = Some(ts);
            }
        }

        Ok(SearchResult {
            term: term.to_string(),
            found: occurrences > 0,
            occurrences,
            last_timestamp: last_timestamp.map(str::to_string),
        })
    }
}
