use async_trait::async_trait;
use health_response::PIVOT_LANGUAGE;
use query_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::types::{QueryInput, REASONING_HISTORY_TURNS, ReasoningOutcome, session_id, session_keys};
use crate::clients::{ReasoningAgent, ReasoningRequest};

/// Hands the pivoted query to the reasoning agent under a deadline.
pub struct ReasoningTask {
    agent: Arc<dyn ReasoningAgent>,
    timeout: Duration,
}

impl ReasoningTask {
    pub fn new(agent: Arc<dyn ReasoningAgent>, timeout: Duration) -> Self {
        Self { agent, timeout }
    }
}

#[async_trait]
impl Task for ReasoningTask {
    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = session_id(&context).await;
        let input: QueryInput = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| FlowError::ContextError("user_input not found".to_string()))?;
        let query: String = context
            .get(session_keys::QUERY_FOR_AGENT)
            .await
            .ok_or_else(|| FlowError::ContextError("query_for_agent not found".to_string()))?;

        let mut history = context.recent_history(REASONING_HISTORY_TURNS).await;
        history.reverse();

        let request = ReasoningRequest {
            query,
            image: input.image,
            preferred_lang: PIVOT_LANGUAGE.to_string(),
            history,
        };

        let outcome = match tokio::time::timeout(self.timeout, self.agent.answer(&request)).await {
            Ok(Ok(raw)) => {
                info!(
                    session_id = %session_id,
                    task_id = %self.id(),
                    chars = raw.len(),
                    "reasoning agent answered"
                );
                ReasoningOutcome::Answered(raw)
            }
            Ok(Err(e)) => {
                error!(
                    session_id = %session_id,
                    task_id = %self.id(),
                    error = %e,
                    "reasoning agent failed"
                );
                ReasoningOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    session_id = %session_id,
                    task_id = %self.id(),
                    timeout_secs = self.timeout.as_secs(),
                    "reasoning agent timed out"
                );
                ReasoningOutcome::TimedOut
            }
        };
        context.set(session_keys::REASONING_OUTCOME, outcome).await;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some("Translating and displaying results".to_string()),
        ))
    }
}
