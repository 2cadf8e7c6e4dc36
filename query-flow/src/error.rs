use thiserror::Error;

/// Errors raised while driving a query session through its task graph.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("context error: {0}")]
    ContextError(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
