use serde::{Deserialize, Serialize};

use crate::localize::{PIVOT_LANGUAGE, primary_subtag};

/// Languages the speech collaborator can voice.
pub const SPEECH_LANGUAGES: &[&str] = &["hi", "mr", "en"];

/// Text to be spoken and the voice to speak it in. Returned to the caller
/// rather than played, so the caller owns the audio output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub lang: String,
}

impl SpeechRequest {
    /// `None` when there is nothing audible to say.
    pub fn new(text: impl Into<String>, detected_lang: &str) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            text,
            lang: speech_language(detected_lang).to_string(),
        })
    }
}

/// Voice for a detected language; unsupported languages are voiced in English.
pub fn speech_language(detected_lang: &str) -> &'static str {
    let subtag = primary_subtag(detected_lang);
    SPEECH_LANGUAGES
        .iter()
        .copied()
        .find(|lang| *lang == subtag)
        .unwrap_or(PIVOT_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_language_mapping() {
        assert_eq!(speech_language("hi"), "hi");
        assert_eq!(speech_language("mr-IN"), "mr");
        assert_eq!(speech_language("ta"), "en");
        assert_eq!(speech_language(""), "en");
    }

    #[test]
    fn test_blank_text_has_no_request() {
        assert_eq!(SpeechRequest::new("   ", "hi"), None);
        let request = SpeechRequest::new("Advice: rest", "hi-IN").unwrap();
        assert_eq!(request.lang, "hi");
    }
}
