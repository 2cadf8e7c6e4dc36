//! Typed schema of the structured block a reasoning tool embeds in its answer.
//!
//! Every field is optional on the wire. `null` is read the same as a missing
//! field, scores are clamped into range, and medicine fields fall back to the
//! [`NOT_AVAILABLE`] sentinel.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Placeholder for medicine fields the lookup source left empty.
pub const NOT_AVAILABLE: &str = "N/A";

pub const MAX_CONFIDENCE: f64 = 100.0;
pub const MAX_CONDITION_SCORE: f64 = 10.0;

/// Which tool produced (or should interpret) a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Intent {
    #[default]
    SymptomCheck,
    MedicalKnowledge,
    DrugInteraction,
    DrugSuggestion,
    DrugCheckerToolFail,
    DrugCheckerParsingFail,
    /// A tag outside the known set, kept verbatim.
    Unknown(String),
}

impl Intent {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "SYMPTOM_CHECK" => Intent::SymptomCheck,
            "MEDICAL_KNOWLEDGE" => Intent::MedicalKnowledge,
            "DRUG_INTERACTION" => Intent::DrugInteraction,
            "DRUG_SUGGESTION" => Intent::DrugSuggestion,
            "DRUG_CHECKER_TOOL_FAIL" => Intent::DrugCheckerToolFail,
            "DRUG_CHECKER_PARSING_FAIL" => Intent::DrugCheckerParsingFail,
            _ => Intent::Unknown(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Intent::SymptomCheck => "SYMPTOM_CHECK",
            Intent::MedicalKnowledge => "MEDICAL_KNOWLEDGE",
            Intent::DrugInteraction => "DRUG_INTERACTION",
            Intent::DrugSuggestion => "DRUG_SUGGESTION",
            Intent::DrugCheckerToolFail => "DRUG_CHECKER_TOOL_FAIL",
            Intent::DrugCheckerParsingFail => "DRUG_CHECKER_PARSING_FAIL",
            Intent::Unknown(tag) => tag,
        }
    }

    /// Symptom analysis and general knowledge answers list possible conditions.
    pub fn lists_conditions(&self) -> bool {
        matches!(self, Intent::SymptomCheck | Intent::MedicalKnowledge)
    }

    /// Interaction checks and suggestions list medicines and safety warnings.
    pub fn lists_medication(&self) -> bool {
        matches!(self, Intent::DrugInteraction | Intent::DrugSuggestion)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.map(|t| Intent::from_tag(&t)).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub intent: Intent,
    #[serde(deserialize_with = "null_as_default")]
    pub simple_advice: String,
    #[serde(deserialize_with = "null_as_default")]
    pub possible_conditions: Vec<Condition>,
    #[serde(deserialize_with = "null_as_default")]
    pub medication_safety_check: Vec<DrugWarning>,
    #[serde(deserialize_with = "null_as_default")]
    pub suggested_medicines: Vec<Medicine>,
    #[serde(deserialize_with = "null_as_default")]
    pub medicines: Vec<Medicine>,
    #[serde(deserialize_with = "confidence_score")]
    pub confidence_score: f64,
}

impl Payload {
    /// A payload carrying nothing but advice and a confidence score.
    pub fn advice_only(intent: Intent, advice: impl Into<String>, confidence_score: f64) -> Self {
        Self {
            intent,
            simple_advice: advice.into(),
            confidence_score: confidence_score.clamp(0.0, MAX_CONFIDENCE),
            ..Self::default()
        }
    }
}

/// Whole-number percentage used by both narration and display. Halves round
/// to the even neighbour.
pub fn confidence_percent(confidence_score: f64) -> u8 {
    confidence_score.clamp(0.0, MAX_CONFIDENCE).round_ties_even() as u8
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "condition_score")]
    pub score: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub relevance: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tests: Vec<TestItem>,
}

/// A recommended test: either a bare name or an object with a `name` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestItem {
    Name(String),
    Detailed(Map<String, Value>),
    Other(Value),
}

impl TestItem {
    pub fn label(&self) -> String {
        match self {
            TestItem::Name(name) => name.clone(),
            TestItem::Detailed(fields) => match fields.get("name").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => Value::Object(fields.clone()).to_string(),
            },
            TestItem::Other(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugWarning {
    #[serde(deserialize_with = "null_as_default")]
    pub warning_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

impl DrugWarning {
    pub fn severity(&self) -> Severity {
        Severity::classify(&self.warning_type)
    }
}

/// Display tier of a safety warning, derived from keywords in its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Major,
    Informational,
}

impl Severity {
    pub fn classify(warning_type: &str) -> Self {
        let lowered = warning_type.to_lowercase();
        if lowered.contains("critical") || lowered.contains("severe") {
            Severity::Critical
        } else if lowered.contains("major") || lowered.contains("moderate") {
            Severity::Major
        } else {
            Severity::Informational
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medicine {
    #[serde(deserialize_with = "text_or_not_available")]
    pub brand_name: String,
    #[serde(deserialize_with = "text_or_not_available")]
    pub generic_name: String,
    #[serde(deserialize_with = "text_or_not_available")]
    pub manufacturer: String,
    #[serde(deserialize_with = "text_or_not_available")]
    pub purpose: String,
    #[serde(deserialize_with = "text_or_not_available")]
    pub warnings: String,
}

impl Default for Medicine {
    fn default() -> Self {
        Self {
            brand_name: NOT_AVAILABLE.to_string(),
            generic_name: NOT_AVAILABLE.to_string(),
            manufacturer: NOT_AVAILABLE.to_string(),
            purpose: NOT_AVAILABLE.to_string(),
            warnings: NOT_AVAILABLE.to_string(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn text_or_not_available<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
}

fn confidence_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .unwrap_or_default()
        .clamp(0.0, MAX_CONFIDENCE))
}

fn condition_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .unwrap_or_default()
        .clamp(0.0, MAX_CONDITION_SCORE))
}
