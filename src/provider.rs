//! Sentiment via the external AI model, with the lexicon scorer as fallback.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::gemini::CompletionClient;
use crate::sentiment::{self, Sentiment, SentimentResult, NEUTRAL_CONFIDENCE};

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(15);

const UNCONFIGURED_EXPLANATION: &str = "AI sentiment model is not configured (GEMINI_API_KEY not set)";
const DEFAULT_AI_EXPLANATION: &str = "Sentiment analyzed by the AI model";

fn build_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of the following text and reply ONLY with a JSON object in the format:\n\
         {{\"sentiment\": \"positive|negative|neutral\", \"confidence\": 0.0-1.0, \"explanation\": \"short explanation\"}}\n\n\
         Text to analyze: \"{}\"",
        text
    )
}

/// Strips a markdown code fence around the JSON, if any, along with its
/// info string (`json`, `JSON`, ...).
fn strip_code_fence(reply: &str) -> &str {
    let reply = reply.trim();
    let Some((_, after)) = reply.split_once("```") else {
        return reply;
    };
    let body = match after.split_once('\n') {
        Some((info, rest)) if is_info_string(info) => rest,
        _ => after,
    };
    body.split("```").next().unwrap_or(body)
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Deserialize)]
struct ModelReply {
    sentiment: Option<String>,
    confidence: Option<Value>,
    explanation: Option<String>,
}

fn parse_confidence(value: Option<Value>) -> Result<f64, ProviderError> {
    let confidence = match value {
        None | Some(Value::Null) => return Ok(NEUTRAL_CONFIDENCE),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| ProviderError::MalformedReply("confidence is not a number".to_string()))?;

    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(ProviderError::MalformedReply(format!(
            "confidence {} outside [0, 1]",
            confidence
        )))
    }
}

/// Parses the model's `{sentiment, confidence, explanation}` reply.
pub fn parse_reply(reply: &str) -> Result<SentimentResult, ProviderError> {
    let json = strip_code_fence(reply).trim();
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ProviderError::MalformedReply(format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ProviderError::MalformedReply("reply is not a JSON object".to_string()));
    }
    let reply: ModelReply = serde_json::from_value(value)
        .map_err(|e| ProviderError::MalformedReply(e.to_string()))?;

    let sentiment = match reply.sentiment.as_deref() {
        None => Sentiment::Neutral,
        Some(label) => Sentiment::parse(label).ok_or_else(|| {
            ProviderError::MalformedReply(format!("unknown sentiment label '{}'", label))
        })?,
    };
    let confidence = parse_confidence(reply.confidence)?;
    let explanation = reply
        .explanation
        .unwrap_or_else(|| DEFAULT_AI_EXPLANATION.to_string());

    Ok(SentimentResult::new(sentiment, confidence, explanation))
}

/// Produces a sentiment for any text. Never fails: when the AI path is
/// unavailable or misbehaves the lexicon scorer answers instead.
pub struct SentimentProvider {
    client: Option<Arc<dyn CompletionClient>>,
    timeout: Duration,
}

impl SentimentProvider {
    pub fn new(client: Arc<dyn CompletionClient>, timeout: Duration) -> Self {
        Self {
            client: Some(client),
            timeout,
        }
    }

    /// Provider without an AI client.
    pub fn unconfigured() -> Self {
        Self {
            client: None,
            timeout: DEFAULT_AI_TIMEOUT,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn model(&self) -> Option<&str> {
        self.client.as_deref().map(|c| c.model())
    }

    pub async fn provide(&self, text: &str) -> SentimentResult {
        let Some(client) = self.client.as_deref() else {
            return SentimentResult::new(
                Sentiment::Neutral,
                NEUTRAL_CONFIDENCE,
                UNCONFIGURED_EXPLANATION,
            );
        };

        match self.ask_model(client, text).await {
            Ok(result) => {
                debug!("AI sentiment from {}: {}", client.model(), result.sentiment);
                result
            }
            Err(e) => {
                warn!("AI sentiment unavailable, using lexicon fallback: {}", e);
                sentiment::score(text)
            }
        }
    }

    /// One attempt, bounded by the configured timeout.
    async fn ask_model(
        &self,
        client: &dyn CompletionClient,
        text: &str,
    ) -> Result<SentimentResult, ProviderError> {
        let prompt = build_prompt(text);
        let reply = tokio::time::timeout(self.timeout, client.complete(&prompt))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))??;
        parse_reply(&reply)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub enum Script {
        Reply(String),
        Fail,
        Hang,
    }

    /// Canned `CompletionClient` that counts its calls.
    pub struct ScriptedClient {
        script: Script,
        pub calls: AtomicUsize,
    }

    impl ScriptedClient {
        pub fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn reply(text: &str) -> Arc<Self> {
            Self::new(Script::Reply(text.to_string()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Reply(text) => Ok(text.clone()),
                Script::Fail => Err(ProviderError::Status {
                    status: 500,
                    body: "boom".to_string(),
                }),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("{}".to_string())
                }
            }
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Script, ScriptedClient};
    use super::*;

    const NEGATIVE_TEXT: &str = "This is terrible and horrible.";

    fn provider_with(client: Arc<ScriptedClient>) -> SentimentProvider {
        SentimentProvider::new(client, Duration::from_millis(200))
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```").trim(), "{\"a\":1}");
        assert_eq!(strip_code_fence("Here:\n```\n{\"a\":1}\n```\nDone").trim(), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fence_any_info_string() {
        assert_eq!(strip_code_fence("```JSON\n{\"a\":1}\n```").trim(), "{\"a\":1}");
        assert_eq!(strip_code_fence("``` Json \n{\"a\":1}\n```").trim(), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");

        let result = parse_reply("```JSON\n{\"sentiment\": \"negative\", \"confidence\": 0.6}\n```").unwrap();
        assert_eq!(result.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_parse_reply() {
        let result = parse_reply(
            "```json\n{\"sentiment\": \"Positive\", \"confidence\": 0.92, \"explanation\": \"upbeat\"}\n```",
        )
        .unwrap();
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert!((result.confidence.unwrap() - 0.92).abs() < 1e-9);
        assert_eq!(result.explanation.as_deref(), Some("upbeat"));
    }

    #[test]
    fn test_parse_reply_defaults() {
        let result = parse_reply("{}").unwrap();
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.confidence, Some(NEUTRAL_CONFIDENCE));
        assert_eq!(result.explanation.as_deref(), Some(DEFAULT_AI_EXPLANATION));

        let result = parse_reply("{\"sentiment\": \"negative\", \"confidence\": \"0.7\"}").unwrap();
        assert_eq!(result.confidence, Some(0.7));
    }

    #[test]
    fn test_parse_reply_rejects_malformed() {
        for reply in [
            "I think it's positive",
            "[\"positive\", 0.9, \"x\"]",
            "{\"sentiment\": \"ecstatic\"}",
            "{\"sentiment\": \"positive\", \"confidence\": 3}",
            "{\"sentiment\": \"positive\", \"confidence\": \"high\"}",
        ] {
            assert!(
                matches!(parse_reply(reply), Err(ProviderError::MalformedReply(_))),
                "{}",
                reply
            );
        }
    }

    #[tokio::test]
    async fn test_unconfigured_is_neutral() {
        let provider = SentimentProvider::unconfigured();
        assert!(!provider.is_configured());

        let result = provider.provide(NEGATIVE_TEXT).await;
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.confidence, Some(NEUTRAL_CONFIDENCE));
        assert_eq!(result.explanation.as_deref(), Some(UNCONFIGURED_EXPLANATION));
    }

    #[tokio::test]
    async fn test_model_reply_is_used() {
        let client = ScriptedClient::reply(
            "{\"sentiment\": \"positive\", \"confidence\": 0.9, \"explanation\": \"model says so\"}",
        );
        let provider = provider_with(client.clone());

        let result = provider.provide(NEGATIVE_TEXT).await;
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert!((result.confidence.unwrap() - 0.9).abs() < 1e-9);
        assert_eq!(result.explanation.as_deref(), Some("model says so"));
        assert_eq!(client.call_count(), 1);
        assert_eq!(provider.model(), Some("scripted"));
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let client = ScriptedClient::new(Script::Fail);
        let result = provider_with(client.clone()).provide(NEGATIVE_TEXT).await;
        assert_eq!(result, sentiment::score(NEGATIVE_TEXT));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_falls_back() {
        let client = ScriptedClient::reply("Sorry, I can't help with that.");
        let result = provider_with(client.clone()).provide(NEGATIVE_TEXT).await;
        assert_eq!(result, sentiment::score(NEGATIVE_TEXT));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let client = ScriptedClient::new(Script::Hang);
        let provider = SentimentProvider::new(client.clone(), Duration::from_millis(20));
        let result = provider.provide(NEGATIVE_TEXT).await;
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(client.call_count(), 1);
    }
}
