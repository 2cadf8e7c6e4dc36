//! Keyword guesser used when a response carries no readable structured block.
//!
//! A medication safety check that failed to produce structured output must
//! never look like "no results", so any medication cue yields a conservative
//! disclaimer instead of an empty answer.

use tracing::info;

use crate::extract::FailureReason;
use crate::payload::{Intent, Payload};

pub const TOOL_FAIL_ADVICE: &str = "The system routed your query to a medication safety tool but couldn't get structured data. Always consult a registered pharmacist or doctor before taking any new medication.";

pub const PARSING_FAIL_ADVICE: &str = "A technical error occurred while processing the medication information. For safety, please consult a healthcare professional regarding your query about medication and symptoms.";

/// Confidence reported alongside a synthesized disclaimer.
pub const FALLBACK_CONFIDENCE: f64 = 15.0;

pub const DEFAULT_RAW_TOKENS: &[&str] = &["drug", "interaction"];
pub const DEFAULT_QUERY_TRIGGERS: &[&str] = &["drug", "interaction", "flexon"];

/// Guesses an intent and a minimal payload from unstructured text.
pub trait FallbackClassifier: Send + Sync {
    fn classify(&self, raw: &str, translated_query: &str, reason: FailureReason)
    -> (Intent, Payload);
}

#[derive(Debug, Clone)]
pub struct KeywordFallbackClassifier {
    raw_tokens: Vec<String>,
    query_triggers: Vec<String>,
}

impl KeywordFallbackClassifier {
    pub fn new<R, Q>(raw_tokens: R, query_triggers: Q) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        Q: IntoIterator,
        Q::Item: AsRef<str>,
    {
        Self {
            raw_tokens: normalize(raw_tokens),
            query_triggers: normalize(query_triggers),
        }
    }

    pub fn with_query_triggers<Q>(self, query_triggers: Q) -> Self
    where
        Q: IntoIterator,
        Q::Item: AsRef<str>,
    {
        Self {
            query_triggers: normalize(query_triggers),
            ..self
        }
    }

    pub fn is_medication_related(&self, raw: &str, translated_query: &str) -> bool {
        let raw = raw.to_lowercase();
        let query = translated_query.to_lowercase();
        self.raw_tokens.iter().any(|token| raw.contains(token.as_str()))
            || self
                .query_triggers
                .iter()
                .any(|trigger| query.contains(trigger.as_str()))
    }
}

impl Default for KeywordFallbackClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RAW_TOKENS, DEFAULT_QUERY_TRIGGERS)
    }
}

impl FallbackClassifier for KeywordFallbackClassifier {
    fn classify(
        &self,
        raw: &str,
        translated_query: &str,
        reason: FailureReason,
    ) -> (Intent, Payload) {
        if !self.is_medication_related(raw, translated_query) {
            return (Intent::SymptomCheck, Payload::default());
        }

        let (intent, advice) = match reason {
            FailureReason::NoBlock => (Intent::DrugCheckerToolFail, TOOL_FAIL_ADVICE),
            FailureReason::ParseError => (Intent::DrugCheckerParsingFail, PARSING_FAIL_ADVICE),
        };
        info!(%intent, ?reason, "medication cue found in unstructured response");

        let payload = Payload::advice_only(intent.clone(), advice, FALLBACK_CONFIDENCE);
        (intent, payload)
    }
}

fn normalize<I>(tokens: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
