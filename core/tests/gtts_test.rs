mod common;

use base64::Engine as _;
use common::{sine_wav_bytes, spawn_server, CannedResponse};
use std::path::PathBuf;
use tts_mini_core::audio::utils::find_ffmpeg;
use tts_mini_core::engine::{GttsConfig, GttsEngine};
use tts_mini_core::{EngineKind, Language, SpeechEngine, SynthesisRequest, TtsError};

fn batchexecute_body(payload: &[u8]) -> Vec<u8> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(payload);
    format!(
        ")]}}'\n\n{}\n[[\"wrb.fr\",\"jQ1olc\",\"[\\\"{}\\\"]\",null,null,null,\"generic\"]]\n",
        encoded.len() + 60,
        encoded
    )
    .into_bytes()
}

fn config(endpoint: &str, ffmpeg_bin: Option<PathBuf>) -> GttsConfig {
    GttsConfig {
        tld: "com".to_string(),
        endpoint: Some(endpoint.to_string()),
        request_timeout_ms: 5_000,
        slow: false,
        ffmpeg_bin,
    }
}

#[test]
fn endpoint_follows_tld() {
    let cfg = GttsConfig {
        tld: "com.tr".to_string(),
        endpoint: None,
        ..GttsConfig::default()
    };
    assert_eq!(
        cfg.url(),
        "https://translate.google.com.tr/_/TranslateWebserverUi/data/batchexecute"
    );
}

#[tokio::test]
async fn missing_ffmpeg_fails_before_network() {
    let engine = GttsEngine::new(config("http://127.0.0.1:9", None), Language::En).unwrap();
    let err = engine
        .synthesize(&SynthesisRequest::new("Hello"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TtsError::SynthesisFailed {
            engine: EngineKind::Gtts,
            ..
        }
    ));
    assert!(err.to_string().contains("ffmpeg"));
}

#[tokio::test]
async fn blank_text_is_invalid_argument() {
    let engine = GttsEngine::new(config("http://127.0.0.1:9", None), Language::En).unwrap();
    let err = engine
        .synthesize(&SynthesisRequest::new(" \n "))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::InvalidArgument(_)));
}

#[tokio::test]
async fn punctuation_only_text_has_nothing_to_speak() {
    let engine = GttsEngine::new(
        config("http://127.0.0.1:9", Some(PathBuf::from("/nonexistent/ffmpeg"))),
        Language::En,
    )
    .unwrap();
    let err = engine
        .synthesize(&SynthesisRequest::new("... !!!"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No text to speak"));
}

#[tokio::test]
async fn response_without_audio_is_synthesis_failure() {
    let (url, _rx) = spawn_server(vec![CannedResponse::ok(
        "application/json",
        b")]}'\n\n[[\"wrb.fr\",\"other\",null]]\n".to_vec(),
    )])
    .await;
    let engine = GttsEngine::new(
        config(&url, Some(PathBuf::from("/nonexistent/ffmpeg"))),
        Language::En,
    )
    .unwrap();
    let err = engine
        .synthesize(&SynthesisRequest::new("Hello"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No audio stream"));
}

#[tokio::test]
async fn http_error_is_synthesis_failure() {
    let (url, _rx) = spawn_server(vec![CannedResponse::status(500, "backend error")]).await;
    let engine = GttsEngine::new(
        config(&url, Some(PathBuf::from("/nonexistent/ffmpeg"))),
        Language::En,
    )
    .unwrap();
    let err = engine
        .synthesize(&SynthesisRequest::new("Hello"))
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("gTTS TTS failed:"));
    assert!(msg.contains("500"));
}

#[cfg(unix)]
mod with_fake_decoder {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in for ffmpeg: keeps a copy of its input and writes a fixed
    /// 16 kHz WAV to the last argument.
    fn fake_ffmpeg(dir: &std::path::Path) -> PathBuf {
        let fixture = dir.join("fixture.wav");
        std::fs::write(&fixture, sine_wav_bytes(16_000, 0.5, 1, 0.8)).unwrap();
        let seen = dir.join("seen.mp3");
        let script = dir.join("ffmpeg");
        std::fs::write(
            &script,
            format!(
                r#"#!/bin/sh
prev=""
for a in "$@"; do
  if [ "$prev" = "-i" ]; then cp "$a" "{seen}"; fi
  prev="$a"
done
cp "{fixture}" "$prev"
"#,
                seen = seen.display(),
                fixture = fixture.display()
            ),
        )
        .unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();
        script
    }

    #[tokio::test]
    async fn long_text_is_chunked_and_segments_concatenated() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = fake_ffmpeg(dir.path());
        let (url, mut rx) = spawn_server(vec![
            CannedResponse::ok("application/json", batchexecute_body(b"SEG-ONE|")),
            CannedResponse::ok("application/json", batchexecute_body(b"SEG-TWO")),
        ])
        .await;
        let engine = GttsEngine::new(config(&url, Some(ffmpeg)), Language::En).unwrap();

        let text = "Merhaba, bu uzun bir deneme cümlesidir. ".repeat(4);
        let audio = engine
            .synthesize(&SynthesisRequest::new(text).language(Language::Tr))
            .await
            .unwrap();
        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.len(), 8_000);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        for req in [&first, &second] {
            assert!(req.head.starts_with("POST "));
            let body = req.body_text();
            assert!(body.starts_with("f.req="));
            assert!(body.contains("jQ1olc"));
            assert!(body.contains("%5C%22tr%5C%22"));
        }
        let seen = std::fs::read(dir.path().join("seen.mp3")).unwrap();
        assert_eq!(seen, b"SEG-ONE|SEG-TWO");
    }
}

#[tokio::test]
async fn decodes_payload_with_real_ffmpeg() {
    let Some(ffmpeg) = find_ffmpeg() else {
        eprintln!("skipping: ffmpeg not found");
        return;
    };
    let (url, _rx) = spawn_server(vec![CannedResponse::ok(
        "application/json",
        batchexecute_body(&sine_wav_bytes(16_000, 0.2, 1, 0.5)),
    )])
    .await;
    let engine = GttsEngine::new(config(&url, Some(ffmpeg)), Language::En).unwrap();
    let audio = engine
        .synthesize(&SynthesisRequest::new("Hello world"))
        .await
        .unwrap();
    assert_eq!(audio.sample_rate, 16_000);
    assert!(!audio.is_empty());
    assert!(audio.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
}
