use query_flow::Context;
use serde::{Deserialize, Serialize};

use crate::clients::QueryImage;

/// Keys of the per-submission values in a session context.
pub mod session_keys {
    /// Set once when the session is created; tags task logs.
    pub const SESSION_ID: &str = "session_id";
    pub const USER_INPUT: &str = "user_input";
    pub const DETECTED_LANG: &str = "detected_lang";
    pub const QUERY_FOR_AGENT: &str = "query_for_agent";
    pub const REASONING_OUTCOME: &str = "reasoning_outcome";
    pub const INTERPRETATION: &str = "interpretation";

    /// Values rebuilt on every submission.
    pub const PER_SUBMISSION: &[&str] = &[
        USER_INPUT,
        DETECTED_LANG,
        QUERY_FOR_AGENT,
        REASONING_OUTCOME,
        INTERPRETATION,
    ];
}

/// What the user submitted: typed or transcribed text, an image, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryInput {
    pub query: String,
    pub image: Option<QueryImage>,
}

/// How the reasoning call ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ReasoningOutcome {
    Answered(String),
    TimedOut,
    Failed(String),
}

/// How many earlier turns the reasoning agent sees.
pub const REASONING_HISTORY_TURNS: usize = 3;

/// Session id stored in the context, for log fields.
pub async fn session_id(context: &Context) -> String {
    context
        .get::<String>(session_keys::SESSION_ID)
        .await
        .unwrap_or_else(|| "unknown".to_string())
}
