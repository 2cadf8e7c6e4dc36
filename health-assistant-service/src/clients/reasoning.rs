use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use super::openrouter::call_openrouter_api;
use super::{ReasoningAgent, ReasoningRequest};

const MAX_TOKENS: u32 = 2000;

const REASONING_PROMPT: &str = r#"You are a health assistant that routes every question to one specialised tool:
- SYMPTOM_CHECK: the user describes symptoms. List possible conditions with a 0-10 likelihood score, why they are relevant and tests that would confirm them.
- MEDICAL_KNOWLEDGE: a general health question. Answer with related conditions in the same shape.
- DRUG_INTERACTION: the user asks whether medicines can be combined. List safety warnings; start each warning_type with Critical, Severe, Major, Moderate or Minor.
- DRUG_SUGGESTION: the user asks what medicine may help. List medicines.

Always finish your answer with exactly one fenced block marked json:
```json
{
  "intent": "SYMPTOM_CHECK | MEDICAL_KNOWLEDGE | DRUG_INTERACTION | DRUG_SUGGESTION",
  "confidence_score": 0-100,
  "simple_advice": "short plain-language advice",
  "possible_conditions": [{"name": "", "score": 0, "relevance": "", "tests": [""]}],
  "medication_safety_check": [{"warning_type": "", "description": ""}],
  "suggested_medicines": [{"brand_name": "", "generic_name": "", "manufacturer": "", "purpose": "", "warnings": ""}],
  "medicines": [{"brand_name": "", "generic_name": "", "manufacturer": "", "purpose": "", "warnings": ""}]
}
```
Never diagnose with certainty and always recommend consulting a doctor or pharmacist when in doubt."#;

/// Reasoning agent on OpenRouter's chat completions API. Images are sent as
/// data URLs next to the question.
pub struct OpenRouterReasoningAgent {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenRouterReasoningAgent {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ReasoningAgent for OpenRouterReasoningAgent {
    async fn answer(&self, request: &ReasoningRequest) -> anyhow::Result<String> {
        info!(
            model = %self.model,
            has_image = request.image.is_some(),
            history_turns = request.history.len(),
            "calling reasoning agent"
        );
        let messages = build_messages(request);
        call_openrouter_api(&self.client, &self.api_key, &self.model, messages, MAX_TOKENS).await
    }
}

fn build_messages(request: &ReasoningRequest) -> Vec<Value> {
    let mut messages = vec![json!({
        "role": "system",
        "content": format!("{}\nRespond in language: {}", REASONING_PROMPT, request.preferred_lang)
    })];

    for entry in &request.history {
        messages.push(json!({ "role": "user", "content": entry.query }));
        messages.push(json!({ "role": "assistant", "content": entry.response }));
    }

    let question = if request.query.trim().is_empty() {
        "Please analyse the attached image."
    } else {
        request.query.as_str()
    };
    let mut content = vec![json!({ "type": "text", "text": question })];
    if let Some(image) = &request.image {
        content.push(json!({
            "type": "image_url",
            "image_url": {
                "url": format!("data:{};base64,{}", image.mime, image.data_base64)
            }
        }));
    }
    messages.push(json!({ "role": "user", "content": content }));

    messages
}
