use async_trait::async_trait;
use health_response::{PIVOT_LANGUAGE, Translator, primary_subtag};
use query_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, warn};

use super::types::{QueryInput, session_id, session_keys};
use crate::clients::LanguageDetector;

/// Detects the query language and pivots the query into the reasoning
/// agent's language.
pub struct LanguageDetectionTask {
    detector: Arc<dyn LanguageDetector>,
    translator: Arc<dyn Translator>,
}

impl LanguageDetectionTask {
    pub fn new(detector: Arc<dyn LanguageDetector>, translator: Arc<dyn Translator>) -> Self {
        Self {
            detector,
            translator,
        }
    }
}

#[async_trait]
impl Task for LanguageDetectionTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = session_id(&context).await;
        let input: QueryInput = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| FlowError::ContextError("user_input not found".to_string()))?;

        let query = input.query.trim();
        let detected_lang = if query.is_empty() {
            PIVOT_LANGUAGE.to_string()
        } else {
            match self.detector.detect(query).await {
                Ok(lang) => lang,
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        task_id = %self.id(),
                        error = %e,
                        "language detection failed, assuming {}",
                        PIVOT_LANGUAGE
                    );
                    PIVOT_LANGUAGE.to_string()
                }
            }
        };

        let query_for_agent = if query.is_empty() || primary_subtag(&detected_lang) == PIVOT_LANGUAGE {
            query.to_string()
        } else {
            match self.translator.translate(query, PIVOT_LANGUAGE).await {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        task_id = %self.id(),
                        error = %e,
                        "query translation failed, sending original text"
                    );
                    query.to_string()
                }
            }
        };

        info!(
            session_id = %session_id,
            task_id = %self.id(),
            detected_lang = %detected_lang,
            "query language detected"
        );
        context.set(session_keys::DETECTED_LANG, &detected_lang).await;
        context.set(session_keys::QUERY_FOR_AGENT, &query_for_agent).await;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some("Determining intent and routing to specialized tool".to_string()),
        ))
    }
}
