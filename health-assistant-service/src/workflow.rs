use health_response::{KeywordFallbackClassifier, ResponsePipeline};
use query_flow::{FlowRunner, Graph, GraphBuilder, Session, SessionStorage, Task};
use std::sync::Arc;
use uuid::Uuid;

use crate::clients::Collaborators;
use crate::config::ServiceConfig;
use crate::tasks::*;

/// detect language → reasoning → interpretation
pub fn build_query_workflow(collaborators: &Collaborators, config: &ServiceConfig) -> Graph {
    let classifier = KeywordFallbackClassifier::default()
        .with_query_triggers(&config.fallback_query_triggers);
    let pipeline =
        ResponsePipeline::new(collaborators.translator.clone()).with_classifier(Arc::new(classifier));

    let detection_task = Arc::new(LanguageDetectionTask::new(
        collaborators.detector.clone(),
        collaborators.translator.clone(),
    ));
    let detection_id = detection_task.id().to_string();

    let reasoning_task = Arc::new(ReasoningTask::new(
        collaborators.reasoning.clone(),
        config.reasoning_timeout,
    ));
    let reasoning_id = reasoning_task.id().to_string();

    let interpretation_task = Arc::new(InterpretationTask::new(pipeline));
    let interpretation_id = interpretation_task.id().to_string();

    GraphBuilder::new("health_query_workflow")
        .add_task(detection_task)
        .add_task(reasoning_task)
        .add_task(interpretation_task)
        .add_edge(&detection_id, &reasoning_id)
        .add_edge(&reasoning_id, &interpretation_id)
        .build()
}

pub fn create_query_session(start_task_id: &str) -> Session {
    let session = Session::new_from_task(Uuid::new_v4().to_string(), start_task_id);
    session
        .context
        .set_sync(session_keys::SESSION_ID, session.id.clone());
    session
}

pub fn create_flow_runner(
    session_storage: Arc<dyn SessionStorage>,
    collaborators: &Collaborators,
    config: &ServiceConfig,
) -> FlowRunner {
    let graph = Arc::new(build_query_workflow(collaborators, config));
    FlowRunner::new(graph, session_storage)
}
