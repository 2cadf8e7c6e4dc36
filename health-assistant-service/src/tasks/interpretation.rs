use async_trait::async_trait;
use health_response::ResponsePipeline;
use query_flow::{Context, FlowError, HistoryEntry, NextAction, Result, Task, TaskResult};
use tracing::info;

use super::types::{QueryInput, ReasoningOutcome, session_id, session_keys};

/// Turns the reasoning outcome into the localized answer and records the turn
/// in the session history.
pub struct InterpretationTask {
    pipeline: ResponsePipeline,
}

impl InterpretationTask {
    pub fn new(pipeline: ResponsePipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Task for InterpretationTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = session_id(&context).await;
        let input: QueryInput = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| FlowError::ContextError("user_input not found".to_string()))?;
        let detected_lang: String = context
            .get(session_keys::DETECTED_LANG)
            .await
            .ok_or_else(|| FlowError::ContextError("detected_lang not found".to_string()))?;
        let query_for_agent: String = context
            .get(session_keys::QUERY_FOR_AGENT)
            .await
            .unwrap_or_default();
        // a missing outcome is treated like a timeout
        let outcome: ReasoningOutcome = context
            .get(session_keys::REASONING_OUTCOME)
            .await
            .unwrap_or(ReasoningOutcome::TimedOut);

        let interpretation = match &outcome {
            ReasoningOutcome::Answered(raw) => {
                self.pipeline
                    .interpret(raw, &query_for_agent, &detected_lang)
                    .await
            }
            ReasoningOutcome::TimedOut | ReasoningOutcome::Failed(_) => {
                self.pipeline
                    .interpret_timeout(&query_for_agent, &detected_lang)
                    .await
            }
        };

        let response_text = match outcome {
            ReasoningOutcome::Answered(raw) => raw,
            _ => interpretation.presentation.advice.clone(),
        };
        let query_text = if input.query.trim().is_empty() {
            "[image]".to_string()
        } else {
            input.query.clone()
        };
        context
            .append_history(HistoryEntry::new(query_text, response_text))
            .await;

        info!(
            session_id = %session_id,
            task_id = %self.id(),
            intent = %interpretation.intent,
            outcome = ?interpretation.outcome,
            "query answered"
        );
        let narration = interpretation.narration.clone();
        context.set(session_keys::INTERPRETATION, &interpretation).await;

        Ok(TaskResult::new_with_status(
            Some(narration),
            NextAction::End,
            Some("Analysis complete".to_string()),
        ))
    }
}
