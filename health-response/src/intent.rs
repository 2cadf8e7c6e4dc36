use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::{Extraction, FailureReason};
use crate::fallback::FallbackClassifier;
use crate::payload::{Intent, Payload};

/// How the final intent was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionOutcome {
    Structured,
    NoBlock,
    ParseError,
}

impl From<FailureReason> for ResolutionOutcome {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::NoBlock => ResolutionOutcome::NoBlock,
            FailureReason::ParseError => ResolutionOutcome::ParseError,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub intent: Intent,
    /// Payload whose `intent` matches the resolved intent.
    pub payload: Payload,
    pub outcome: ResolutionOutcome,
}

/// Decide the intent of a response: the structured block's own tag when it was
/// readable, otherwise whatever the fallback classifier makes of the raw text.
pub fn resolve(
    extraction: Extraction,
    raw: &str,
    translated_query: &str,
    classifier: &dyn FallbackClassifier,
) -> Resolution {
    let reason = match extraction {
        Extraction::Parsed(payload) => {
            return Resolution {
                intent: payload.intent.clone(),
                payload,
                outcome: ResolutionOutcome::Structured,
            };
        }
        Extraction::NoBlock => FailureReason::NoBlock,
        Extraction::ParseError(detail) => {
            debug!(%detail, "resolving intent from malformed block");
            FailureReason::ParseError
        }
    };

    let (intent, mut payload) = classifier.classify(raw, translated_query, reason);
    payload.intent = intent.clone();
    Resolution {
        intent,
        payload,
        outcome: reason.into(),
    }
}
