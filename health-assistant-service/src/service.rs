use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use health_response::Interpretation;
use query_flow::{FlowRunner, InMemorySessionStorage, Session, SessionStorage};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    clients::{Collaborators, MedicineSource, QueryImage},
    config::ServiceConfig,
    models::{
        HistoryResponse, LimitParams, MedicinesResponse, QueryRequest, QueryResponse,
        SessionCreated,
    },
    tasks::{session_keys, types::QueryInput},
    workflow::{create_flow_runner, create_query_session},
};

const DEFAULT_MEDICINE_LIMIT: usize = 50;
const MAX_MEDICINE_LIMIT: usize = 100;
const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

pub const EMPTY_SUBMISSION_MESSAGE: &str =
    "Please enter a query, record a voice prompt, or upload an image before submitting.";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn upstream_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub flow_runner: FlowRunner,
    pub medicines: Arc<dyn MedicineSource>,
    pub history_limit: usize,
}

pub fn create_app(config: &ServiceConfig) -> Router {
    build_app(config, Collaborators::from_config(config))
}

/// Router over explicit collaborators; tests pass doubles here.
pub fn build_app(config: &ServiceConfig, collaborators: Collaborators) -> Router {
    let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
    let flow_runner = create_flow_runner(session_storage.clone(), &collaborators, config);

    let app_state = AppState {
        session_storage,
        flow_runner,
        medicines: collaborators.medicines,
        history_limit: config.history_limit,
    };
    build_router(app_state)
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/assistant/sessions", post(create_session))
        .route("/assistant/{session_id}/query", post(submit_query))
        .route(
            "/assistant/{session_id}/history",
            get(get_history).delete(clear_history),
        )
        .route("/medicines", get(list_medicines))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Health Assistant Service",
        "version": "0.1.0",
        "description": "Symptom and medication questions answered in the user's language",
        "endpoints": {
            "POST /assistant/sessions": "Start a conversation",
            "POST /assistant/{session_id}/query": "Ask a question (text and/or image)",
            "GET /assistant/{session_id}/history": "Recent questions, newest first",
            "DELETE /assistant/{session_id}/history": "Clear the conversation history",
            "GET /medicines": "Medicine catalogue from openFDA",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(State(state): State<AppState>) -> ApiResult<SessionCreated> {
    let start_task_id = state
        .flow_runner
        .graph()
        .start_task_id()
        .ok_or_else(|| internal_error("Workflow has no start task", "empty graph"))?;

    let session = create_query_session(&start_task_id);
    let session_id = session.id.clone();
    save_session(&state, session).await?;

    info!(session_id = %session_id, "session created");
    Ok(Json(SessionCreated { session_id }))
}

async fn submit_query(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<QueryResponse> {
    let input = validate_query(request)?;
    info!(
        session_id = %session_id,
        has_text = !input.query.is_empty(),
        has_image = input.image.is_some(),
        "query received"
    );

    let session = load_session(&state, &session_id).await?;
    for key in session_keys::PER_SUBMISSION {
        session.context.remove(key).await;
    }
    session.context.set(session_keys::USER_INPUT, &input).await;
    save_session(&state, session).await?;

    let result = state
        .flow_runner
        .run_from_start(&session_id)
        .await
        .map_err(|e| {
            error!(session_id = %session_id, error = %e, "workflow failed");
            internal_error("Failed to analyse query", &e.to_string())
        })?;
    info!(session_id = %session_id, status = ?result.status, "workflow finished");

    let session = load_session(&state, &session_id).await?;
    let interpretation: Interpretation = session
        .context
        .get(session_keys::INTERPRETATION)
        .await
        .ok_or_else(|| internal_error("Workflow finished without an answer", &session_id))?;

    Ok(Json(QueryResponse {
        session_id,
        status_message: session.status_message,
        interpretation,
    }))
}

fn validate_query(request: QueryRequest) -> Result<QueryInput, ApiError> {
    let query = request.query.trim().to_string();
    let image = match request.image_base64.as_deref().map(str::trim) {
        Some(data) if !data.is_empty() => Some(parse_image(data, request.image_mime.as_deref())?),
        _ => None,
    };

    if query.is_empty() && image.is_none() {
        return Err(bad_request_error(EMPTY_SUBMISSION_MESSAGE));
    }
    Ok(QueryInput { query, image })
}

fn parse_image(data: &str, mime: Option<&str>) -> Result<QueryImage, ApiError> {
    let (mime, data) = match data.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
        Some((url_mime, payload)) => (url_mime.to_string(), payload),
        None => (mime.unwrap_or("image/jpeg").to_string(), data),
    };

    let mime = mime.to_lowercase();
    if !SUPPORTED_IMAGE_TYPES.contains(&mime.as_str()) {
        return Err(bad_request_error("Image must be a JPEG or PNG"));
    }
    STANDARD
        .decode(data)
        .map_err(|_| bad_request_error("Image must be base64 encoded"))?;

    Ok(QueryImage {
        mime,
        data_base64: data.to_string(),
    })
}

async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> ApiResult<HistoryResponse> {
    let session = load_session(&state, &session_id).await?;
    let limit = params.limit.unwrap_or(state.history_limit);
    let entries = session.context.recent_history(limit).await;

    Ok(Json(HistoryResponse {
        session_id,
        entries,
    }))
}

async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    let session = load_session(&state, &session_id).await?;
    session.context.clear_history().await;
    save_session(&state, session).await?;

    info!(session_id = %session_id, "history cleared");
    Ok(Json(json!({
        "session_id": session_id,
        "status": "cleared"
    })))
}

async fn list_medicines(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<MedicinesResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_MEDICINE_LIMIT)
        .clamp(1, MAX_MEDICINE_LIMIT);

    let medicines = state.medicines.fetch_all_medicines(limit).await.map_err(|e| {
        error!(error = %e, "medicine lookup failed");
        upstream_error("Failed to fetch medicines", &e.to_string())
    })?;

    Ok(Json(MedicinesResponse {
        count: medicines.len(),
        medicines,
    }))
}

async fn load_session(state: &AppState, session_id: &str) -> Result<Session, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

async fn save_session(state: &AppState, session: Session) -> Result<(), ApiError> {
    state.session_storage.save(session).await.map_err(|e| {
        error!("Failed to save session: {}", e);
        internal_error("Failed to save session", &e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{LanguageDetector, ReasoningAgent, ReasoningRequest};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use health_response::{Intent, Medicine, TranslationError, Translator};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Treats text containing "namaste" as Hindi.
    struct KeywordDetector;

    #[async_trait]
    impl LanguageDetector for KeywordDetector {
        async fn detect(&self, text: &str) -> anyhow::Result<String> {
            Ok(if text.contains("namaste") { "hi" } else { "en" }.to_string())
        }
    }

    struct TagTranslator;

    #[async_trait]
    impl Translator for TagTranslator {
        async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
            Ok(format!("[{}] {}", target_lang, text))
        }
    }

    /// Replays canned answers and records what it was asked.
    struct ScriptedAgent {
        answer: Option<String>,
        delay: Duration,
        requests: Mutex<Vec<ReasoningRequest>>,
    }

    impl ScriptedAgent {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                delay: Duration::ZERO,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReasoningAgent for ScriptedAgent {
        async fn answer(&self, request: &ReasoningRequest) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            self.answer.clone().ok_or_else(|| anyhow!("agent offline"))
        }
    }

    struct StaticMedicines(Option<Vec<Medicine>>);

    #[async_trait]
    impl MedicineSource for StaticMedicines {
        async fn fetch_all_medicines(&self, limit: usize) -> anyhow::Result<Vec<Medicine>> {
            match &self.0 {
                Some(medicines) => Ok(medicines.iter().take(limit).cloned().collect()),
                None => Err(anyhow!("openFDA returned 503")),
            }
        }
    }

    fn test_config() -> ServiceConfig {
        ServiceConfig::from_lookup(|key| match key {
            "OPENROUTER_API_KEY" => Some("test".to_string()),
            "REASONING_TIMEOUT_SECS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn app_with(agent: Arc<ScriptedAgent>, medicines: StaticMedicines) -> Router {
        let collaborators = Collaborators {
            detector: Arc::new(KeywordDetector),
            translator: Arc::new(TagTranslator),
            reasoning: agent,
            medicines: Arc::new(medicines),
        };
        build_app(&test_config(), collaborators)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/assistant/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_structured_answer_end_to_end() {
        let agent = Arc::new(ScriptedAgent::answering(
            "Here you go\n```json\n{\"intent\":\"DRUG_INTERACTION\",\"confidence_score\":80,\"medication_safety_check\":[{\"warning_type\":\"Severe Interaction\",\"description\":\"Do not combine X and Y\"}]}\n```",
        ));
        let app = app_with(agent.clone(), StaticMedicines(Some(Vec::new())));
        let session_id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "query": "Can I take X with Y?" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let interpretation = &body["interpretation"];
        assert_eq!(interpretation["intent"], "DRUG_INTERACTION");
        assert_eq!(interpretation["presentation"]["template"], "medication");
        assert_eq!(interpretation["presentation"]["warnings"][0]["severity"], "critical");
        assert!(
            interpretation["narration"]
                .as_str()
                .unwrap()
                .contains("Severe Interaction. Do not combine X and Y.")
        );
        assert_eq!(interpretation["speech"]["lang"], "en");
        assert_eq!(body["status_message"], "Analysis complete");

        let requests = agent.requests.lock().unwrap();
        assert_eq!(requests[0].query, "Can I take X with Y?");
        assert_eq!(requests[0].preferred_lang, "en");
    }

    #[tokio::test]
    async fn test_foreign_query_is_pivoted_and_answer_localized() {
        let agent = Arc::new(ScriptedAgent::answering(
            "```json\n{\"intent\":\"SYMPTOM_CHECK\",\"confidence_score\":60,\"simple_advice\":\"rest\",\"possible_conditions\":[{\"name\":\"Flu\",\"score\":7}]}\n```",
        ));
        let app = app_with(agent.clone(), StaticMedicines(Some(Vec::new())));
        let session_id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "query": "namaste, mujhe bukhar hai" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            agent.requests.lock().unwrap()[0].query,
            "[en] namaste, mujhe bukhar hai"
        );
        let interpretation = &body["interpretation"];
        assert_eq!(interpretation["payload"]["simple_advice"], "[hi] rest");
        assert_eq!(interpretation["presentation"]["conditions"][0]["name"], "[hi] Flu");
        assert_eq!(interpretation["speech"]["lang"], "hi");
    }

    #[tokio::test]
    async fn test_agent_failure_falls_back_to_disclaimer() {
        let agent = Arc::new(ScriptedAgent {
            answer: None,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        });
        let app = app_with(agent, StaticMedicines(Some(Vec::new())));
        let session_id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "query": "Is flexon safe with coffee?" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let interpretation = &body["interpretation"];
        assert_eq!(interpretation["intent"], Intent::DrugCheckerToolFail.as_str());
        assert_eq!(interpretation["payload"]["confidence_score"], 15.0);
        assert_eq!(interpretation["outcome"], "no-block");
    }

    #[tokio::test]
    async fn test_slow_agent_times_out_safely() {
        let agent = Arc::new(ScriptedAgent {
            answer: Some("```json\n{\"intent\":\"DRUG_SUGGESTION\"}\n```".to_string()),
            delay: Duration::from_secs(5),
            requests: Mutex::new(Vec::new()),
        });
        let app = app_with(agent, StaticMedicines(Some(Vec::new())));
        let session_id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "query": "I have a headache" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interpretation"]["intent"], "SYMPTOM_CHECK");
        assert_eq!(body["interpretation"]["outcome"], "no-block");
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected() {
        let app = app_with(
            Arc::new(ScriptedAgent::answering("unused")),
            StaticMedicines(Some(Vec::new())),
        );
        let session_id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "query": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], EMPTY_SUBMISSION_MESSAGE);
    }

    #[tokio::test]
    async fn test_image_only_submission_is_accepted() {
        let agent = Arc::new(ScriptedAgent::answering("Looks like a mild rash."));
        let app = app_with(agent.clone(), StaticMedicines(Some(Vec::new())));
        let session_id = new_session(&app).await;

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "image_base64": "data:image/png;base64,aGVsbG8=" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let requests = agent.requests.lock().unwrap();
        let image = requests[0].image.as_ref().unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.data_base64, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_bad_image_is_rejected() {
        let app = app_with(
            Arc::new(ScriptedAgent::answering("unused")),
            StaticMedicines(Some(Vec::new())),
        );
        let session_id = new_session(&app).await;

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "image_base64": "not base64!!", "image_mime": "image/png" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/assistant/{}/query", session_id),
            Some(json!({ "image_base64": "aGVsbG8=", "image_mime": "image/gif" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = app_with(
            Arc::new(ScriptedAgent::answering("unused")),
            StaticMedicines(Some(Vec::new())),
        );

        let (status, body) = call(
            &app,
            Method::POST,
            "/assistant/missing/query",
            Some(json!({ "query": "hello" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["session_id"], "missing");
    }

    #[tokio::test]
    async fn test_history_records_and_clears() {
        let agent = Arc::new(ScriptedAgent::answering("Drink fluids."));
        let app = app_with(agent.clone(), StaticMedicines(Some(Vec::new())));
        let session_id = new_session(&app).await;
        let query_uri = format!("/assistant/{}/query", session_id);
        let history_uri = format!("/assistant/{}/history", session_id);

        for query in ["first question", "second question"] {
            call(&app, Method::POST, &query_uri, Some(json!({ "query": query }))).await;
        }

        let (_, body) = call(&app, Method::GET, &history_uri, None).await;
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["query"], "second question");
        assert_eq!(entries[0]["response"], "Drink fluids.");

        // the second call saw the first turn as context
        assert_eq!(agent.requests.lock().unwrap()[1].history.len(), 1);

        let (_, body) = call(&app, Method::GET, &format!("{}?limit=1", history_uri), None).await;
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);

        let (status, _) = call(&app, Method::DELETE, &history_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, Method::GET, &history_uri, None).await;
        assert!(body["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_medicines_endpoint() {
        let medicines = vec![
            Medicine {
                brand_name: "Advil".to_string(),
                ..Medicine::default()
            },
            Medicine::default(),
        ];
        let app = app_with(
            Arc::new(ScriptedAgent::answering("unused")),
            StaticMedicines(Some(medicines)),
        );

        let (status, body) = call(&app, Method::GET, "/medicines?limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["medicines"][0]["brand_name"], "Advil");
        assert_eq!(body["medicines"][0]["generic_name"], "N/A");

        let failing = app_with(
            Arc::new(ScriptedAgent::answering("unused")),
            StaticMedicines(None),
        );
        let (status, _) = call(&failing, Method::GET, "/medicines", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
