use anyhow::anyhow;
use async_trait::async_trait;
use health_response::{TranslationError, Translator};
use rig::completion::Prompt;
use tracing::debug;

use super::LanguageDetector;
use super::openrouter::get_llm_agent;

const TRANSLATION_PREAMBLE: &str = "You are a medical translator. Translate the user's text into the requested language. Keep drug names, numbers and units unchanged. Reply with the translation only, without quotes or commentary.";

const DETECTION_PREAMBLE: &str = "You identify the language of a text. Reply with the two-letter ISO 639-1 code only, for example: en, hi, mr.";

/// Translation and language detection backed by an LLM on OpenRouter.
pub struct LlmTranslator {
    api_key: String,
    model: String,
}

impl LlmTranslator {
    pub fn new(api_key: String, model: String) -> Self {
        Self { api_key, model }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let agent = get_llm_agent(&self.api_key, &self.model, TRANSLATION_PREAMBLE);
        let prompt = format!("Target language: {}\n\nText:\n{}", target_lang, text);
        let translated = agent
            .prompt(prompt.as_str())
            .await
            .map_err(|e| TranslationError::Unavailable(e.to_string()))?;

        let translated = translated.trim();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResult);
        }
        debug!(target_lang, chars = translated.len(), "translated text");
        Ok(translated.to_string())
    }
}

#[async_trait]
impl LanguageDetector for LlmTranslator {
    async fn detect(&self, text: &str) -> anyhow::Result<String> {
        let agent = get_llm_agent(&self.api_key, &self.model, DETECTION_PREAMBLE);
        let reply = agent.prompt(text).await?;
        parse_language_code(&reply).ok_or_else(|| anyhow!("unrecognised language code: {}", reply))
    }
}

/// First word of the reply, if it looks like an ISO 639 code.
fn parse_language_code(reply: &str) -> Option<String> {
    let code = reply
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .to_lowercase();

    let primary = code.split('-').next().unwrap_or_default();
    let valid = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_lowercase());
    valid.then_some(code)
}
