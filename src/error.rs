//! Error types for the analysis engine and the AI provider.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of [`crate::analyzer::TextAnalyzer`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    /// Empty or whitespace-only text/term. Rejected before any processing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected failure inside the engine (e.g. a poisoned store lock).
    /// The message is for logs only and never reaches HTTP clients.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures of the external AI path. These never leave the provider:
/// every variant resolves to the local heuristic.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("AI request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),

    #[error("AI service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI service returned no candidates")]
    EmptyReply,

    #[error("malformed AI reply: {0}")]
    MalformedReply(String),
}

// Request URLs are stripped before the error can reach a log line.
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.without_url())
    }
}
