use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::payload::Payload;

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json\s*([\s\S]+?)\s*```").expect("static pattern"));

/// Why no structured payload could be taken from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// The response carried no fenced json block at all.
    NoBlock,
    /// A block was there but its content did not match the payload schema.
    ParseError,
}

/// Result of looking for the structured block in a raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(Payload),
    NoBlock,
    ParseError(String),
}

impl Extraction {
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Extraction::Parsed(_) => None,
            Extraction::NoBlock => Some(FailureReason::NoBlock),
            Extraction::ParseError(_) => Some(FailureReason::ParseError),
        }
    }
}

/// Pull the first fenced json block out of `raw` and read it as a [`Payload`].
pub fn extract(raw: &str) -> Extraction {
    let Some(block) = JSON_BLOCK
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
    else {
        debug!(raw_len = raw.len(), "no structured block in response");
        return Extraction::NoBlock;
    };

    let parsed = serde_json::from_str::<Value>(block)
        .map_err(|e| format!("invalid json: {}", e))
        .and_then(|value| match value {
            Value::Object(_) => serde_json::from_value::<Payload>(value)
                .map_err(|e| format!("payload does not match schema: {}", e)),
            other => Err(format!("expected an object, found {}", json_kind(&other))),
        });

    match parsed {
        Ok(payload) => Extraction::Parsed(payload),
        Err(reason) => {
            warn!(%reason, "structured block could not be read");
            Extraction::ParseError(reason)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
