//! Interpretation of reasoning-tool answers for the health assistant.
//!
//! A reasoning agent answers in free text that may embed a fenced json block.
//! This crate extracts that block, decides which tool answered, falls back to a
//! conservative disclaimer when the block is missing or broken, translates the
//! result into the user's language and assembles a narration for speech output.

pub mod error;
pub mod extract;
pub mod fallback;
pub mod intent;
pub mod localize;
pub mod narration;
pub mod payload;
pub mod pipeline;
pub mod render;
pub mod speech;

#[cfg(test)]
mod testing;

pub use error::TranslationError;
pub use extract::{Extraction, FailureReason, extract};
pub use fallback::{FallbackClassifier, KeywordFallbackClassifier};
pub use intent::{Resolution, ResolutionOutcome, resolve};
pub use localize::{
    Localizer, PIVOT_LANGUAGE, TranslatedCondition, TranslatedPayload, TranslatedWarning,
    Translator, primary_subtag,
};
pub use narration::compose;
pub use payload::{Condition, DrugWarning, Intent, Medicine, NOT_AVAILABLE, Payload, Severity, TestItem};
pub use pipeline::{Interpretation, ResponsePipeline};
pub use render::{Presentation, Template, render};
pub use speech::{SpeechRequest, speech_language};
