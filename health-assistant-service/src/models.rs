use health_response::{Interpretation, Medicine};
use query_flow::HistoryEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    /// Plain base64 or a `data:<mime>;base64,` URL.
    pub image_base64: Option<String>,
    pub image_mime: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub session_id: String,
    pub status_message: Option<String>,
    pub interpretation: Interpretation,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MedicinesResponse {
    pub count: usize,
    pub medicines: Vec<Medicine>,
}
