//! `FlowRunner` loads a session, runs one submission through the graph and
//! saves the session back, so HTTP handlers stay a single call.
//!
//! Create it once at startup and share it through the application state; it
//! only holds two `Arc`s.

use std::sync::Arc;
use tracing::info;

use crate::{
    error::{FlowError, Result},
    graph::{ExecutionResult, Graph},
    storage::SessionStorage,
};

/// Load → execute → save.
#[derive(Clone)]
pub struct FlowRunner {
    graph: Arc<Graph>,
    storage: Arc<dyn SessionStorage>,
}

impl FlowRunner {
    pub fn new(graph: Arc<Graph>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { graph, storage }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Run the session from its current task and persist the updated session.
    pub async fn run(&self, session_id: &str) -> Result<ExecutionResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let result = self.graph.execute_session(&mut session).await?;
        info!(
            session_id = %session_id,
            status = ?result.status,
            current_task = %session.current_task_id,
            "session step finished"
        );

        self.storage.save(session).await?;

        Ok(result)
    }

    /// Rewind the session to the graph's start task and run it, which is how a
    /// fresh submission enters an existing conversation.
    pub async fn run_from_start(&self, session_id: &str) -> Result<ExecutionResult> {
        let start = self
            .graph
            .start_task_id()
            .ok_or_else(|| FlowError::TaskNotFound("start task".to_string()))?;

        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;
        session.current_task_id = start;
        self.storage.save(session).await?;

        self.run(session_id).await
    }
}
