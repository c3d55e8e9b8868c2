//! Text analysis service: word statistics, sentiment with an AI model and a
//! lexicon fallback, and term search over an in-memory history of analyses.

pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod provider;
pub mod sentiment;
pub mod store;
pub mod text;

pub use analyzer::{Clock, SystemClock, TextAnalyzer, TextInput};
pub use config::Settings;
pub use error::{AnalysisError, ProviderError};
pub use provider::SentimentProvider;
pub use sentiment::{Sentiment, SentimentResult};
pub use store::{AnalysisRecord, AnalysisStore, Fingerprint, SearchResult};
pub use text::WordFrequency;
