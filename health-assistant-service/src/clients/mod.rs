//! Collaborators the workflow talks to, behind traits so tasks can be
//! exercised without network access.

pub mod openfda;
pub mod openrouter;
pub mod reasoning;
pub mod translation;

use async_trait::async_trait;
use health_response::{Medicine, Translator};
use query_flow::HistoryEntry;
use std::sync::Arc;

pub use openfda::OpenFdaClient;
pub use reasoning::OpenRouterReasoningAgent;
pub use translation::LlmTranslator;

use crate::config::ServiceConfig;

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Short language code of `text`, e.g. `hi`.
    async fn detect(&self, text: &str) -> anyhow::Result<String>;
}

/// Attached image, as received from the client.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QueryImage {
    pub mime: String,
    pub data_base64: String,
}

#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub query: String,
    pub image: Option<QueryImage>,
    pub preferred_lang: String,
    /// Earlier turns, oldest first.
    pub history: Vec<HistoryEntry>,
}

/// The multi-tool reasoning agent; answers in free text that may embed a
/// fenced json block.
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    async fn answer(&self, request: &ReasoningRequest) -> anyhow::Result<String>;
}

#[async_trait]
pub trait MedicineSource: Send + Sync {
    async fn fetch_all_medicines(&self, limit: usize) -> anyhow::Result<Vec<Medicine>>;
}

/// Everything the service needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub detector: Arc<dyn LanguageDetector>,
    pub translator: Arc<dyn Translator>,
    pub reasoning: Arc<dyn ReasoningAgent>,
    pub medicines: Arc<dyn MedicineSource>,
}

impl Collaborators {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let translator = Arc::new(LlmTranslator::new(
            config.openrouter_api_key.clone(),
            config.translation_model.clone(),
        ));
        Self {
            detector: translator.clone(),
            translator,
            reasoning: Arc::new(OpenRouterReasoningAgent::new(
                config.openrouter_api_key.clone(),
                config.reasoning_model.clone(),
            )),
            medicines: Arc::new(OpenFdaClient::new(config.openfda_url.clone())),
        }
    }
}
