//! The analysis service: ties text statistics, sentiment and the store together.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::AnalysisError;
use crate::gemini::GeminiClient;
use crate::provider::SentimentProvider;
use crate::store::{AnalysisRecord, AnalysisStore, SearchResult};
use crate::text;

/// Source of ISO-8601 timestamps. Values must never go backwards, so that
/// string order matches time order.
pub trait Clock: Send + Sync {
    fn now_iso(&self) -> String;
}

/// UTC wall clock with fixed microsecond precision, clamped to be
/// non-decreasing within the process.
#[derive(Default)]
pub struct SystemClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock for SystemClock {
    fn now_iso(&self) -> String {
        let mut now = Utc::now();
        // a poisoned lock only loses the clamp, the timestamp is still valid
        if let Ok(mut last) = self.last.lock() {
            if let Some(prev) = *last {
                if now < prev {
                    now = prev;
                }
            }
            *last = Some(now);
        }
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Text accepted for analysis: trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput(String);

impl TextInput {
    pub fn parse(raw: &str) -> Result<Self, AnalysisError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::InvalidArgument(
                "text must not be empty".to_string(),
            ));
        }
        Ok(TextInput(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

pub struct TextAnalyzer {
    store: AnalysisStore,
    provider: SentimentProvider,
    clock: Box<dyn Clock>,
}

impl TextAnalyzer {
    pub fn new(store: AnalysisStore, provider: SentimentProvider) -> Self {
        Self::with_clock(store, provider, Box::new(SystemClock::default()))
    }

    /// Wires store and provider from settings. A Gemini client that cannot
    /// be built leaves the service running on the unconfigured path.
    pub fn from_settings(settings: &Settings) -> Self {
        let store = AnalysisStore::new(settings.store_capacity);

        let provider = match &settings.gemini_api_key {
            None => {
                warn!("GEMINI_API_KEY not set. Sentiment analysis will be limited.");
                SentimentProvider::unconfigured()
            }
            Some(key) => match GeminiClient::new(
                key.as_str(),
                settings.gemini_model.as_str(),
                settings.gemini_base_url.as_str(),
                settings.ai_timeout,
            ) {
                Ok(client) => {
                    info!("Gemini client configured with model {}", settings.gemini_model);
                    SentimentProvider::new(Arc::new(client), settings.ai_timeout)
                }
                Err(e) => {
                    error!("Failed to initialize Gemini client: {}", e);
                    SentimentProvider::unconfigured()
                }
            },
        };

        Self::new(store, provider)
    }

    pub fn with_clock(store: AnalysisStore, provider: SentimentProvider, clock: Box<dyn Clock>) -> Self {
        Self {
            store,
            provider,
            clock,
        }
    }

    /// Analyzes `raw` and stores the result. Empty text is rejected before
    /// anything else happens.
    pub async fn analyze(&self, raw: &str) -> Result<AnalysisRecord, AnalysisError> {
        let input = TextInput::parse(raw)?;

        let word_count = text::word_count(input.as_str());
        let top_words = text::rank_words(input.as_str(), true);
        // no store lock is held across this await
        let sentiment = self.provider.provide(input.as_str()).await;
        let timestamp = self.clock.now_iso();

        let record = AnalysisRecord::new(input.into_inner(), word_count, top_words, sentiment, timestamp);
        self.store.record(record.clone())?;

        info!(
            "Analyzed text of {} words ({}), fingerprint {}",
            record.word_count, record.sentiment.sentiment, record.fingerprint
        );
        Ok(record)
    }

    pub fn search(&self, term: &str) -> Result<SearchResult, AnalysisError> {
        let result = self.store.search(term)?;
        info!("Search for '{}': {} occurrences", term, result.occurrences);
        Ok(result)
    }

    pub fn store_size(&self) -> Result<usize, AnalysisError> {
        self.store.len()
    }

    pub fn ai_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn ai_model(&self) -> Option<&str> {
        self.provider.model()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Ticks one second per call, starting at a fixed instant.
    #[derive(Default)]
    pub struct StepClock {
        ticks: AtomicU64,
    }

    impl Clock for StepClock {
        fn now_iso(&self) -> String {
            let n = self.ticks.fetch_add(1, Ordering::SeqCst);
            format!("2026-01-01T{:02}:{:02}:{:02}.000000Z", n / 3600, (n / 60) % 60, n % 60)
        }
    }
}
