//! Google Translate speech backend.
//!
//! Speaks through the same `batchexecute` RPC the Translate web UI uses. Text
//! is sent in chunks of at most 100 characters; each response carries one
//! base64 MP3 segment and the segments are concatenated before decoding.
//! Speed, pitch and speaker are not supported by the endpoint and are ignored.

use super::{EngineKind, SpeechEngine};
use crate::audio::utils::{decode_with_ffmpeg, find_ffmpeg};
use crate::audio::AudioBuffer;
use crate::language::Language;
use crate::request::SynthesisRequest;
use crate::{Result, TtsError};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest chunk the endpoint accepts.
pub const GOOGLE_TTS_MAX_CHARS: usize = 100;

const GOOGLE_TTS_RPC: &str = "jQ1olc";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Clone, Debug)]
pub struct GttsConfig {
    /// Top-level domain of the Translate host, e.g. `com` or `com.tr`.
    pub tld: String,
    /// Full endpoint override; when unset it is derived from `tld`.
    pub endpoint: Option<String>,
    pub request_timeout_ms: u64,
    /// Ask for the slower reading voice.
    pub slow: bool,
    /// Decoder for the MP3 payload.
    pub ffmpeg_bin: Option<PathBuf>,
}

impl Default for GttsConfig {
    fn default() -> Self {
        Self {
            tld: std::env::var("GTTS_TLD")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "com".to_string()),
            endpoint: std::env::var("GTTS_ENDPOINT").ok().filter(|s| !s.is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            slow: false,
            ffmpeg_bin: find_ffmpeg(),
        }
    }
}

impl GttsConfig {
    pub fn url(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
                self.tld
            )
        })
    }
}

pub struct GttsEngine {
    http: Client,
    cfg: GttsConfig,
    default_language: Language,
}

impl GttsEngine {
    pub fn new(cfg: GttsConfig, default_language: Language) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                TtsError::synthesis(EngineKind::Gtts, format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            http,
            cfg,
            default_language,
        })
    }

    async fn fetch_chunk(&self, url: &str, chunk: &str, language: Language) -> Result<Vec<u8>> {
        let form = [("f.req", package_rpc(chunk, language, self.cfg.slow))];
        let resp = self
            .http
            .post(url)
            .header("referer", "http://translate.google.com/")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "gtts", error = %e, "Request failed");
                TtsError::synthesis(
                    EngineKind::Gtts,
                    format!("Check your internet connection ({e})"),
                )
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(target: "gtts", %status, "Endpoint returned error");
            return Err(TtsError::synthesis(
                EngineKind::Gtts,
                format!("status={} body={}", status, truncate(&body, 200)),
            ));
        }

        let body = resp.text().await.map_err(|e| {
            TtsError::synthesis(EngineKind::Gtts, format!("Failed to read response: {e}"))
        })?;
        extract_audio(&body)
            .map_err(|e| TtsError::synthesis(EngineKind::Gtts, e))?
            .ok_or_else(|| {
                TtsError::synthesis(EngineKind::Gtts, "No audio stream in response")
            })
    }
}

#[async_trait]
impl SpeechEngine for GttsEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Gtts
    }

    fn default_language(&self) -> Language {
        self.default_language
    }

    async fn render(&self, request: &SynthesisRequest, language: Language) -> Result<AudioBuffer> {
        if request.has_prosody_hints() {
            debug!(target: "gtts", "speed/pitch/speaker are not supported and will be ignored");
        }
        let ffmpeg = self.cfg.ffmpeg_bin.clone().ok_or_else(|| {
            TtsError::synthesis(
                EngineKind::Gtts,
                "ffmpeg not found; it is required to decode MP3 audio",
            )
        })?;

        let chunks = split_text(&request.text, GOOGLE_TTS_MAX_CHARS);
        if chunks.is_empty() {
            return Err(TtsError::synthesis(EngineKind::Gtts, "No text to speak"));
        }

        let url = self.cfg.url();
        let mut mp3 = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(target: "gtts", part = idx, chars = chunk.chars().count(), "POST {}", url);
            mp3.extend(self.fetch_chunk(&url, chunk, language).await?);
        }

        let audio = tokio::task::spawn_blocking(move || decode_with_ffmpeg(&ffmpeg, &mp3, "mp3"))
            .await
            .map_err(|e| TtsError::synthesis(EngineKind::Gtts, e.to_string()))?
            .map_err(|e| TtsError::synthesis(EngineKind::Gtts, format!("MP3 decode failed: {e}")))?;
        Ok(audio)
    }
}

/// Build the `f.req` form value for one chunk.
pub fn package_rpc(text: &str, language: Language, slow: bool) -> String {
    let speed = if slow { Value::Bool(true) } else { Value::Null };
    let parameter = json!([text, language.code(), speed, "null"]).to_string();
    json!([[[GOOGLE_TTS_RPC, parameter, Value::Null, "generic"]]]).to_string()
}

/// Pull the base64 MP3 segments out of a `batchexecute` response.
///
/// `Ok(None)` means no line carried audio; `Err` means a payload was found but
/// was not valid base64.
pub fn extract_audio(body: &str) -> std::result::Result<Option<Vec<u8>>, String> {
    const START: &str = r#"jQ1olc","[\""#;
    const END: &str = r#"\"]"#;

    let mut audio: Option<Vec<u8>> = None;
    for line in body.lines().filter(|l| l.contains(GOOGLE_TTS_RPC)) {
        let Some(start) = line.find(START).map(|i| i + START.len()) else {
            continue;
        };
        let Some(end) = line.rfind(END).filter(|&e| e >= start) else {
            continue;
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&line[start..end])
            .map_err(|e| format!("Invalid audio payload: {e}"))?;
        audio.get_or_insert_with(Vec::new).extend(bytes);
    }
    Ok(audio)
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Breaks fall after clause punctuation (`.`, `,`, `;`, `:`, `!`, `?`) when a
/// whole clause fits; longer clauses are split on whitespace and words longer
/// than the limit are cut. Chunks with nothing speakable are dropped.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for clause in split_clauses(text) {
        let clause_len = clause.chars().count();
        if clause_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(split_words(&clause, max_chars));
            continue;
        }
        if !current.is_empty() && current_len + 1 + clause_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&clause);
        current_len += clause_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks.retain(|c| c.chars().any(char::is_alphanumeric));
    chunks
}

/// Whitespace-normalized clauses, each ending at punctuation followed by
/// whitespace (or at the end of the text).
fn split_clauses(text: &str) -> Vec<String> {
    const CLAUSE_END: &[char] = &['.', ',', ';', ':', '!', '?'];

    let mut clauses = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(CLAUSE_END) {
            clauses.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        clauses.push(current.join(" "));
    }
    clauses
}

fn split_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }
        if !current.is_empty() && current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_matches_translate_ui_shape() {
        let rpc = package_rpc("Hello", Language::En, false);
        assert_eq!(
            rpc,
            r#"[[["jQ1olc","[\"Hello\",\"en\",null,\"null\"]",null,"generic"]]]"#
        );
        let slow = package_rpc("Merhaba", Language::Tr, true);
        assert!(slow.contains(r#"\"tr\",true"#));
    }

    #[test]
    fn extracts_and_concatenates_segments() {
        let payload = base64::engine::general_purpose::STANDARD.encode(b"ID3abc");
        let body = format!(
            ")]}}'\n\n123\n[[\"wrb.fr\",\"jQ1olc\",\"[\\\"{payload}\\\"]\",null,null,null,\"generic\"]]\n"
        );
        let audio = extract_audio(&body).unwrap().unwrap();
        assert_eq!(audio, b"ID3abc");

        let twice = format!("{body}{body}");
        assert_eq!(extract_audio(&twice).unwrap().unwrap(), b"ID3abcID3abc");
    }

    #[test]
    fn no_audio_line_is_none() {
        assert_eq!(extract_audio(")]}'\n[[\"er\",null]]").unwrap(), None);
    }

    #[test]
    fn bad_base64_is_error() {
        let body = "[[\"wrb.fr\",\"jQ1olc\",\"[\\\"!!not-base64!!\\\"]\"]]";
        assert!(extract_audio(body).is_err());
    }

    #[test]
    fn split_respects_limit_and_words() {
        let text = "This is a test of long text synthesis. ".repeat(30);
        let chunks = split_text(&text, GOOGLE_TTS_MAX_CHARS);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= GOOGLE_TTS_MAX_CHARS);
            assert!(!c.starts_with(' ') && !c.ends_with(' '));
        }
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn split_prefers_clause_boundaries() {
        let long = "and then it keeps going without any punctuation at all until the chunk limit is nearly reached";
        let text = format!("First sentence is short. {long}");
        let chunks = split_text(&text, GOOGLE_TTS_MAX_CHARS);
        assert_eq!(chunks, vec!["First sentence is short.".to_string(), long.to_string()]);

        let chunks = split_text("One, two; three. Four! Five?", 12);
        assert_eq!(chunks, vec!["One, two;", "three. Four!", "Five?"]);
    }

    #[test]
    fn split_falls_back_to_whitespace_inside_long_clause() {
        let text = format!("Short. {}", "word ".repeat(30).trim_end());
        let chunks = split_text(&text, 40);
        assert_eq!(chunks[0], "Short.");
        assert!(chunks[1..].iter().all(|c| c.chars().count() <= 40));
        assert_eq!(chunks[1..].join(" "), "word ".repeat(30).trim_end());
    }

    #[test]
    fn split_counts_characters_not_bytes() {
        let text = "çığ köprü şüphe örneği";
        let chunks = split_text(text, 12);
        assert_eq!(chunks, vec!["çığ köprü", "şüphe örneği"]);
    }

    #[test]
    fn split_cuts_oversized_words_and_drops_punctuation() {
        let chunks = split_text(&"a".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "aaaaa");
        assert!(split_text("... !!! ?", 100).is_empty());
    }
}
