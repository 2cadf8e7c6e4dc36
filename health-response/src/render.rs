use serde::{Deserialize, Serialize};

use crate::localize::{TranslatedCondition, TranslatedPayload, TranslatedWarning};
use crate::payload::{Intent, Medicine, confidence_percent};

pub const NO_FINDINGS_NOTICE: &str = "No specific conditions or medicine suggestions found. Please provide more details or consult a healthcare professional.";

pub fn routing_label(intent: &Intent) -> String {
    format!("Query was directed to the {} tool.", intent.as_str())
}

pub const CHECKER_EMPTY_NOTICE: &str = "The medication checker ran, but did not find a specific result. Please rely on the Simple Advice.";

/// Display layout chosen for an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum Template {
    Conditions {
        conditions: Vec<TranslatedCondition>,
        suggested_medicines: Vec<Medicine>,
    },
    Medication {
        medicines: Vec<Medicine>,
        warnings: Vec<TranslatedWarning>,
    },
    AdviceOnly,
}

/// Everything a front end needs to draw one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub intent: Intent,
    pub routing_label: String,
    pub confidence_percent: u8,
    #[serde(flatten)]
    pub template: Template,
    pub advice: String,
    /// Shown instead of an empty result list.
    pub notice: Option<String>,
}

pub fn render(intent: &Intent, translated: &TranslatedPayload) -> Presentation {
    let (template, notice) = if intent.lists_conditions() {
        let empty = translated.possible_conditions.is_empty()
            && translated.suggested_medicines.is_empty();
        (
            Template::Conditions {
                conditions: translated.possible_conditions.clone(),
                suggested_medicines: translated.suggested_medicines.clone(),
            },
            empty.then(|| NO_FINDINGS_NOTICE.to_string()),
        )
    } else if intent.lists_medication() {
        (
            Template::Medication {
                medicines: translated.medicines.clone(),
                warnings: translated.medication_safety_check.clone(),
            },
            translated
                .medication_safety_check
                .is_empty()
                .then(|| CHECKER_EMPTY_NOTICE.to_string()),
        )
    } else {
        (Template::AdviceOnly, None)
    };

    Presentation {
        intent: intent.clone(),
        routing_label: routing_label(intent),
        confidence_percent: confidence_percent(translated.confidence_score),
        template,
        advice: translated.simple_advice.clone(),
        notice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Severity;

    fn translated() -> TranslatedPayload {
        TranslatedPayload {
            intent: Intent::SymptomCheck,
            language: "en".to_string(),
            simple_advice: "See a doctor".to_string(),
            possible_conditions: Vec::new(),
            medication_safety_check: Vec::new(),
            suggested_medicines: Vec::new(),
            medicines: Vec::new(),
            confidence_score: 42.4,
        }
    }

    #[test]
    fn test_symptom_without_findings_gets_notice() {
        let presentation = render(&Intent::SymptomCheck, &translated());
        assert!(matches!(presentation.template, Template::Conditions { .. }));
        assert_eq!(presentation.notice.as_deref(), Some(NO_FINDINGS_NOTICE));
        assert_eq!(presentation.confidence_percent, 42);
        assert_eq!(
            presentation.routing_label,
            "Query was directed to the SYMPTOM_CHECK tool."
        );
    }

    #[test]
    fn test_suggested_medicines_alone_suppress_notice() {
        let mut payload = translated();
        payload.suggested_medicines.push(Medicine::default());
        let presentation = render(&Intent::MedicalKnowledge, &payload);
        assert_eq!(presentation.notice, None);
    }

    #[test]
    fn test_medication_template_keeps_severity() {
        let mut payload = translated();
        payload.medication_safety_check.push(TranslatedWarning {
            warning_type: "Moderate".to_string(),
            description: "Space the doses".to_string(),
            severity: Severity::Major,
        });
        let presentation = render(&Intent::DrugInteraction, &payload);
        let Template::Medication { warnings, .. } = &presentation.template else {
            panic!("expected medication template");
        };
        assert_eq!(warnings[0].severity, Severity::Major);
        assert_eq!(presentation.notice, None);
    }

    #[test]
    fn test_suggestion_without_warnings_gets_checker_notice() {
        let presentation = render(&Intent::DrugSuggestion, &translated());
        assert_eq!(presentation.notice.as_deref(), Some(CHECKER_EMPTY_NOTICE));
    }

    #[test]
    fn test_fallback_and_unknown_intents_are_advice_only() {
        for intent in [
            Intent::DrugCheckerToolFail,
            Intent::DrugCheckerParsingFail,
            Intent::Unknown("YOGA_COACH".to_string()),
        ] {
            let presentation = render(&intent, &translated());
            assert_eq!(presentation.template, Template::AdviceOnly);
            assert_eq!(presentation.notice, None);
            assert_eq!(presentation.advice, "See a doctor");
            assert!(presentation.routing_label.contains(intent.as_str()));
        }
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(render(&Intent::DrugSuggestion, &translated())).unwrap();
        assert_eq!(value["template"], "medication");
        assert_eq!(value["intent"], "DRUG_SUGGESTION");
        assert_eq!(
            value["routing_label"],
            "Query was directed to the DRUG_SUGGESTION tool."
        );
        assert!(value["warnings"].as_array().unwrap().is_empty());
    }
}
