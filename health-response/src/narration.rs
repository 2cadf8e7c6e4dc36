use crate::localize::{Localizer, TranslatedPayload};
use crate::payload::{Intent, confidence_percent};

/// Build the single string handed to speech output: confidence first, then the
/// intent's findings in their original order, then the advice.
pub async fn compose(translated: &TranslatedPayload, intent: &Intent, localizer: &Localizer) -> String {
    let lang = translated.language.as_str();
    let mut fragments = Vec::new();

    let confidence = format!(
        "Overall confidence score is {} percent.",
        confidence_percent(translated.confidence_score)
    );
    fragments.push(localizer.translate_phrase(&confidence, lang).await);

    if intent.lists_conditions() {
        for condition in &translated.possible_conditions {
            if condition.name.trim().is_empty() {
                continue;
            }
            let chance = format!("{:.1} out of 10 chance.", condition.score);
            let chance = localizer.translate_phrase(&chance, lang).await;
            fragments.push(format!("{}. {}", condition.name, chance));
        }
    } else if *intent == Intent::DrugInteraction {
        for warning in &translated.medication_safety_check {
            let parts: Vec<String> = [&warning.warning_type, &warning.description]
                .into_iter()
                .filter(|part| !part.trim().is_empty())
                .map(|part| as_sentence(part))
                .collect();
            if !parts.is_empty() {
                fragments.push(parts.join(" "));
            }
        }
    }

    if !translated.simple_advice.trim().is_empty() {
        let label = localizer.translate_phrase("Advice:", lang).await;
        fragments.push(format!("{} {}", label, translated.simple_advice));
    }

    fragments.join(" ")
}

fn as_sentence(text: &str) -> String {
    format!("{}.", text.trim_end().trim_end_matches('.'))
}
