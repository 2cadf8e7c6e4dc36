use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::error::TranslationError;
use crate::payload::{Condition, DrugWarning, Intent, Medicine, NOT_AVAILABLE, Payload, Severity};

/// Language the reasoning tool always answers in.
pub const PIVOT_LANGUAGE: &str = "en";

/// Text translation collaborator.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError>;
}

/// Lower-cased primary subtag of a language code, e.g. `hi-IN` → `hi`.
pub fn primary_subtag(lang: &str) -> String {
    lang.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedCondition {
    pub name: String,
    pub score: f64,
    pub relevance: String,
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedWarning {
    pub warning_type: String,
    pub description: String,
    /// Taken from the untranslated type so keyword matching stays in the pivot language.
    pub severity: Severity,
}

/// A [`Payload`] with its human-readable text in the user's language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedPayload {
    pub intent: Intent,
    pub language: String,
    pub simple_advice: String,
    pub possible_conditions: Vec<TranslatedCondition>,
    pub medication_safety_check: Vec<TranslatedWarning>,
    pub suggested_medicines: Vec<Medicine>,
    pub medicines: Vec<Medicine>,
    pub confidence_score: f64,
}

/// Translates payload fields one call at a time. A field whose translation
/// fails keeps its source text.
#[derive(Clone)]
pub struct Localizer {
    translator: Arc<dyn Translator>,
}

impl Localizer {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    /// Translate one piece of text. Empty text, the `N/A` sentinel and any
    /// target in the pivot language come back unchanged.
    pub async fn translate_field(&self, text: &str, target_lang: &str) -> String {
        if text.trim().is_empty() || text == NOT_AVAILABLE || is_pivot(target_lang) {
            return text.to_string();
        }

        match self.translator.translate(text, target_lang).await {
            Ok(translated) if !translated.trim().is_empty() => translated,
            Ok(_) => {
                warn!(target_lang, "empty translation, keeping source text");
                text.to_string()
            }
            Err(e) => {
                warn!(target_lang, error = %e, "translation failed, keeping source text");
                text.to_string()
            }
        }
    }

    /// Fixed narration and notice wording goes through the same path as payload fields.
    pub async fn translate_phrase(&self, phrase: &str, target_lang: &str) -> String {
        self.translate_field(phrase, target_lang).await
    }

    /// Translate the fields that the payload's intent presents. Fields no
    /// template shows for that intent are carried over as they are.
    pub async fn localize(&self, payload: &Payload, target_lang: &str) -> TranslatedPayload {
        let intent = &payload.intent;
        let simple_advice = self.translate_field(&payload.simple_advice, target_lang).await;

        let mut possible_conditions = Vec::with_capacity(payload.possible_conditions.len());
        for condition in &payload.possible_conditions {
            let condition = if intent.lists_conditions() {
                self.localize_condition(condition, target_lang).await
            } else {
                carry_condition(condition)
            };
            possible_conditions.push(condition);
        }

        let mut medication_safety_check = Vec::with_capacity(payload.medication_safety_check.len());
        for warning in &payload.medication_safety_check {
            let warning = if intent.lists_medication() {
                self.localize_warning(warning, target_lang).await
            } else {
                carry_warning(warning)
            };
            medication_safety_check.push(warning);
        }

        let suggested_medicines = if intent.lists_conditions() {
            self.localize_medicines(&payload.suggested_medicines, target_lang)
                .await
        } else {
            payload.suggested_medicines.clone()
        };
        let medicines = if intent.lists_medication() {
            self.localize_medicines(&payload.medicines, target_lang).await
        } else {
            payload.medicines.clone()
        };

        TranslatedPayload {
            intent: intent.clone(),
            language: target_lang.to_string(),
            simple_advice,
            possible_conditions,
            medication_safety_check,
            suggested_medicines,
            medicines,
            confidence_score: payload.confidence_score,
        }
    }

    async fn localize_condition(&self, condition: &Condition, target_lang: &str) -> TranslatedCondition {
        let mut tests = Vec::with_capacity(condition.tests.len());
        for test in &condition.tests {
            tests.push(self.translate_field(&test.label(), target_lang).await);
        }
        TranslatedCondition {
            name: self.translate_field(&condition.name, target_lang).await,
            score: condition.score,
            relevance: self.translate_field(&condition.relevance, target_lang).await,
            tests,
        }
    }

    async fn localize_warning(&self, warning: &DrugWarning, target_lang: &str) -> TranslatedWarning {
        TranslatedWarning {
            warning_type: self.translate_field(&warning.warning_type, target_lang).await,
            description: self.translate_field(&warning.description, target_lang).await,
            severity: warning.severity(),
        }
    }

    /// Names and manufacturers are identifiers and stay as the lookup returned them.
    async fn localize_medicines(&self, medicines: &[Medicine], target_lang: &str) -> Vec<Medicine> {
        let mut localized = Vec::with_capacity(medicines.len());
        for medicine in medicines {
            localized.push(Medicine {
                purpose: self.translate_field(&medicine.purpose, target_lang).await,
                warnings: self.translate_field(&medicine.warnings, target_lang).await,
                ..medicine.clone()
            });
        }
        localized
    }
}

fn is_pivot(target_lang: &str) -> bool {
    primary_subtag(target_lang) == PIVOT_LANGUAGE
}

fn carry_condition(condition: &Condition) -> TranslatedCondition {
    TranslatedCondition {
        name: condition.name.clone(),
        score: condition.score,
        relevance: condition.relevance.clone(),
        tests: condition.tests.iter().map(|t| t.label()).collect(),
    }
}

fn carry_warning(warning: &DrugWarning) -> TranslatedWarning {
    TranslatedWarning {
        warning_type: warning.warning_type.clone(),
        description: warning.description.clone(),
        severity: warning.severity(),
    }
}
