use thiserror::Error;

/// Failure of a single call to the translation service.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation service unavailable: {0}")]
    Unavailable(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("translation service returned no text")]
    EmptyResult,
}
