//! Translator doubles shared by the unit tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::TranslationError;
use crate::localize::Translator;

/// Prefixes text with the target language and remembers every request.
#[derive(Default)]
pub struct RecordingTranslator {
    calls: Mutex<Vec<String>>,
}

impl RecordingTranslator {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for RecordingTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(format!("[{}] {}", target_lang, text))
    }
}

/// Like [`RecordingTranslator`] but errors on one specific text.
pub struct FailingTranslator {
    poison: String,
}

impl FailingTranslator {
    pub fn on(poison: &str) -> Self {
        Self {
            poison: poison.to_string(),
        }
    }
}

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        if text == self.poison {
            return Err(TranslationError::Unavailable("connection reset".to_string()));
        }
        Ok(format!("[{}] {}", target_lang, text))
    }
}
