use anyhow::{Context as _, anyhow};
use health_response::fallback::DEFAULT_QUERY_TRIGGERS;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REASONING_MODEL: &str = "openai/gpt-4.1-mini";
pub const DEFAULT_TRANSLATION_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_REASONING_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_OPENFDA_URL: &str = "https://api.fda.gov/drug/label.json";
pub const DEFAULT_HISTORY_LIMIT: usize = 7;

/// Service settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub openrouter_api_key: String,
    pub port: u16,
    pub reasoning_model: String,
    pub translation_model: String,
    pub reasoning_timeout: Duration,
    pub openfda_url: String,
    pub fallback_query_triggers: Vec<String>,
    pub history_limit: usize,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let openrouter_api_key = lookup("OPENROUTER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY environment variable is required"))?;

        let port = match lookup("PORT") {
            Some(port) => port.parse().context("PORT must be a port number")?,
            None => DEFAULT_PORT,
        };

        let reasoning_timeout_secs = match lookup("REASONING_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse()
                .context("REASONING_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_REASONING_TIMEOUT_SECS,
        };

        let history_limit = match lookup("HISTORY_LIMIT") {
            Some(limit) => limit.parse().context("HISTORY_LIMIT must be a number")?,
            None => DEFAULT_HISTORY_LIMIT,
        };

        let fallback_query_triggers = match lookup("FALLBACK_QUERY_TRIGGERS") {
            Some(list) => list
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_QUERY_TRIGGERS.iter().map(|t| t.to_string()).collect(),
        };

        Ok(Self {
            openrouter_api_key,
            port,
            reasoning_model: lookup("REASONING_MODEL")
                .unwrap_or_else(|| DEFAULT_REASONING_MODEL.to_string()),
            translation_model: lookup("TRANSLATION_MODEL")
                .unwrap_or_else(|| DEFAULT_TRANSLATION_MODEL.to_string()),
            reasoning_timeout: Duration::from_secs(reasoning_timeout_secs),
            openfda_url: lookup("OPENFDA_URL").unwrap_or_else(|| DEFAULT_OPENFDA_URL.to_string()),
            fallback_query_triggers,
            history_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "k")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.history_limit, 7);
        assert_eq!(config.reasoning_timeout, Duration::from_secs(60));
        assert_eq!(config.fallback_query_triggers, vec!["drug", "interaction", "flexon"]);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "k"),
            ("PORT", "8080"),
            ("REASONING_TIMEOUT_SECS", "5"),
            ("FALLBACK_QUERY_TRIGGERS", "dolo, ,crocin"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.reasoning_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_query_triggers, vec!["dolo", "crocin"]);
    }

    #[test]
    fn test_missing_key_and_bad_port() {
        assert!(ServiceConfig::from_lookup(lookup_from(&[])).is_err());
        assert!(
            ServiceConfig::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "k"), ("PORT", "x")]))
                .is_err()
        );
    }
}
