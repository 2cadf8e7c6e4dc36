use anyhow::anyhow;
use reqwest::Client;
use rig::{agent::Agent, client::CompletionClient, providers::openrouter};
use serde_json::{Value, json};

pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub fn get_llm_agent(
    api_key: &str,
    model: &str,
    preamble: &str,
) -> Agent<openrouter::CompletionModel> {
    let client = openrouter::Client::new(api_key);
    client.agent(model).preamble(preamble).build()
}

/// Raw chat completion call, used where message content mixes text and images.
pub async fn call_openrouter_api(
    client: &Client,
    api_key: &str,
    model: &str,
    messages: Vec<Value>,
    max_tokens: u32,
) -> anyhow::Result<String> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "max_tokens": max_tokens
    });

    let response = client
        .post(OPENROUTER_CHAT_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("LLM API request failed: {}", response.status()));
    }

    let response_json: Value = response.json().await?;
    completion_text(&response_json)
}

fn completion_text(response: &Value) -> anyhow::Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid response format from LLM"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_text() {
        let response = json!({ "choices": [{ "message": { "content": "hello" } }] });
        assert_eq!(completion_text(&response).unwrap(), "hello");
        assert!(completion_text(&json!({ "error": "quota" })).is_err());
    }
}
