//! Supported synthesis languages and their UI labels.

use crate::{Result, TtsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serializes as the code; deserializes from a code or a UI label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Language {
    #[default]
    En,
    Tr,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Tr];

    /// UI labels offered to the user, in display order.
    /// There is no distinct UK voice; both English labels map to `en`.
    pub const LABELS: [&'static str; 3] = ["English (US)", "English (UK)", "Turkish"];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Tr => "tr",
        }
    }

    /// Sample sentence used when the user did not type anything.
    pub fn example_text(&self) -> &'static str {
        match self {
            Language::En => {
                "Hello! This is a test of the text-to-speech system. How does it sound?"
            }
            Language::Tr => "Merhaba! Bu metin-konuşma sisteminin bir testidir. Nasıl ses veriyor?",
        }
    }

    /// Map a UI label to a language. Unknown labels fall back to English.
    pub fn from_label(label: &str) -> Language {
        label.parse().unwrap_or_default()
    }
}

impl FromStr for Language {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "English (US)" | "English (UK)" => return Ok(Language::En),
            "Turkish" => return Ok(Language::Tr),
            _ => {}
        }
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "tr" => Ok(Language::Tr),
            _ => Err(TtsError::InvalidArgument(format!(
                "Unsupported language: {:?}. Supported: [\"en\", \"tr\"]",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = TtsError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
