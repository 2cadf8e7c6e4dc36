use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::extract::{Extraction, extract};
use crate::fallback::{FallbackClassifier, KeywordFallbackClassifier};
use crate::intent::{ResolutionOutcome, resolve};
use crate::localize::{Localizer, TranslatedPayload, Translator};
use crate::narration::compose;
use crate::payload::Intent;
use crate::render::{Presentation, render};
use crate::speech::SpeechRequest;

/// The fully interpreted answer to one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub intent: Intent,
    pub outcome: ResolutionOutcome,
    pub payload: TranslatedPayload,
    pub narration: String,
    pub presentation: Presentation,
    pub speech: Option<SpeechRequest>,
}

/// raw response → payload → intent → translated fields → narration and display.
///
/// Never fails: every malformed or missing input ends in a safe, populated
/// [`Interpretation`].
#[derive(Clone)]
pub struct ResponsePipeline {
    localizer: Localizer,
    classifier: Arc<dyn FallbackClassifier>,
}

impl ResponsePipeline {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            localizer: Localizer::new(translator),
            classifier: Arc::new(KeywordFallbackClassifier::default()),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn FallbackClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    /// `translated_query` is the user's query in the pivot language; it is only
    /// scanned for fallback cues.
    pub async fn interpret(
        &self,
        raw: &str,
        translated_query: &str,
        detected_lang: &str,
    ) -> Interpretation {
        self.interpret_extraction(extract(raw), raw, translated_query, detected_lang)
            .await
    }

    /// A reasoning call that ran out of time reads as a response with no block.
    pub async fn interpret_timeout(&self, translated_query: &str, detected_lang: &str) -> Interpretation {
        self.interpret_extraction(Extraction::NoBlock, "", translated_query, detected_lang)
            .await
    }

    async fn interpret_extraction(
        &self,
        extraction: Extraction,
        raw: &str,
        translated_query: &str,
        detected_lang: &str,
    ) -> Interpretation {
        let resolution = resolve(extraction, raw, translated_query, self.classifier.as_ref());
        info!(
            intent = %resolution.intent,
            outcome = ?resolution.outcome,
            detected_lang,
            "response resolved"
        );

        let payload = self.localizer.localize(&resolution.payload, detected_lang).await;
        let narration = compose(&payload, &resolution.intent, &self.localizer).await;

        let mut presentation = render(&resolution.intent, &payload);
        presentation.routing_label = self
            .localizer
            .translate_phrase(&presentation.routing_label, detected_lang)
            .await;
        if let Some(notice) = presentation.notice.take() {
            presentation.notice = Some(self.localizer.translate_phrase(&notice, detected_lang).await);
        }

        let speech = SpeechRequest::new(narration.clone(), detected_lang);

        Interpretation {
            intent: resolution.intent,
            outcome: resolution.outcome,
            payload,
            narration,
            presentation,
            speech,
        }
    }
}
