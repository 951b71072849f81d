use crate::language::Language;
use crate::{Result, TtsError};

/// Message shared by every backend so callers can match on it.
pub const EMPTY_TEXT_MESSAGE: &str = "'text' must be a non-empty string";

/// A single synthesis call.
///
/// `speaker`, `speed` and `pitch` are hints. Whether a backend honors them is
/// part of that backend's contract; callers must not assume they take effect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: Option<Language>,
    pub speaker: Option<String>,
    pub speed: Option<f32>,
    pub pitch: Option<f32>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Runs before any backend is touched.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(TtsError::InvalidArgument(EMPTY_TEXT_MESSAGE.to_string()));
        }
        Ok(())
    }

    pub fn has_prosody_hints(&self) -> bool {
        self.speaker.is_some() || self.speed.is_some() || self.pitch.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_text_rejected() {
        for text in ["", "   ", "\n\t "] {
            let err = SynthesisRequest::new(text).validate().unwrap_err();
            match err {
                TtsError::InvalidArgument(msg) => assert_eq!(msg, EMPTY_TEXT_MESSAGE),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn builder_sets_hints() {
        let req = SynthesisRequest::new("hi")
            .language(Language::Tr)
            .speaker("p225")
            .speed(1.2)
            .pitch(-2.0);
        assert!(req.validate().is_ok());
        assert_eq!(req.language, Some(Language::Tr));
        assert_eq!(req.speaker.as_deref(), Some("p225"));
        assert!(req.has_prosody_hints());
        assert!(!SynthesisRequest::new("hi").has_prosody_hints());
    }
}
