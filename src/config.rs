//! Runtime settings read from the environment (and `.env` via dotenv).

use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::provider::DEFAULT_AI_TIMEOUT;
use crate::store::DEFAULT_STORE_CAPACITY;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ai_timeout: Duration,
    pub store_capacity: usize,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            ai_timeout: DEFAULT_AI_TIMEOUT,
            store_capacity: DEFAULT_STORE_CAPACITY,
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using default", name, value);
            default
        }),
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let store_capacity = match parse_or("STORE_CAPACITY", get("STORE_CAPACITY"), defaults.store_capacity) {
            0 => {
                warn!("STORE_CAPACITY must be at least 1, using {}", DEFAULT_STORE_CAPACITY);
                DEFAULT_STORE_CAPACITY
            }
            n => n,
        };

        let ai_timeout = match parse_or("AI_TIMEOUT_SECS", get("AI_TIMEOUT_SECS"), defaults.ai_timeout.as_secs()) {
            0 => {
                warn!("AI_TIMEOUT_SECS must be at least 1, using {}", DEFAULT_AI_TIMEOUT.as_secs());
                DEFAULT_AI_TIMEOUT
            }
            secs => Duration::from_secs(secs),
        };

        Self {
            gemini_api_key: get("GEMINI_API_KEY").map(|k| k.trim().to_string()),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            ai_timeout,
            store_capacity,
            host: get("APP_HOST").unwrap_or(defaults.host),
            port: parse_or("APP_PORT", get("APP_PORT"), defaults.port),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s, Settings::default());
        assert_eq!(s.bind_addr(), "0.0.0.0:3000");
        assert!(s.gemini_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("GEMINI_API_KEY", " secret "),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("AI_TIMEOUT_SECS", "5"),
            ("STORE_CAPACITY", "10"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "8080"),
        ]);
        assert_eq!(s.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(s.gemini_model, "gemini-1.5-pro");
        assert_eq!(s.ai_timeout, Duration::from_secs(5));
        assert_eq!(s.store_capacity, 10);
        assert_eq!(s.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let s = settings(&[
            ("GEMINI_API_KEY", "   "),
            ("STORE_CAPACITY", "0"),
            ("APP_PORT", "not-a-port"),
            ("AI_TIMEOUT_SECS", "-3"),
        ]);
        assert!(s.gemini_api_key.is_none());
        assert_eq!(s.store_capacity, DEFAULT_STORE_CAPACITY);
        assert_eq!(s.port, 3000);
        assert_eq!(s.ai_timeout, DEFAULT_AI_TIMEOUT);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let s = settings(&[("AI_TIMEOUT_SECS", "0")]);
        assert_eq!(s.ai_timeout, DEFAULT_AI_TIMEOUT);
        assert!(!s.ai_timeout.is_zero());
    }
}
