pub mod interpretation;
pub mod language_detection;
pub mod reasoning;
pub mod types;

pub use interpretation::InterpretationTask;
pub use language_detection::LanguageDetectionTask;
pub use reasoning::ReasoningTask;

pub use types::session_keys;
