//! One `speak` invocation: synthesize with a primary (and optional comparison)
//! engine, then export WAV, MP3 and waveform files for each result.
//!
//! Engine failures do not abort the invocation; they become notices and the
//! report simply carries fewer outputs. Only artifact I/O errors propagate.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use tracing::{info, warn};
use tts_mini_audio::{plot_waveform, write_lossless, LossyEncoder};
use tts_mini_core::{
    AudioBuffer, EngineKind, EngineSet, Language, Result, SynthesisRequest, TtsError,
};

pub const SPEED_RANGE: RangeInclusive<f32> = 0.5..=1.5;
pub const PITCH_RANGE: RangeInclusive<f32> = -5.0..=5.0;

#[derive(Clone, Debug, PartialEq)]
pub struct SpeakOptions {
    pub text: String,
    pub language: Language,
    pub speed: f32,
    pub pitch: f32,
}

impl SpeakOptions {
    /// Without text, the language's example sentence is spoken.
    pub fn new(text: Option<String>, language: Language, speed: f32, pitch: f32) -> Self {
        Self {
            text: text.unwrap_or_else(|| language.example_text().to_string()),
            language,
            speed: clamp_or(speed, SPEED_RANGE, 1.0),
            pitch: clamp_or(pitch, PITCH_RANGE, 0.0),
        }
    }

    pub fn has_prosody(&self) -> bool {
        self.speed != 1.0 || self.pitch != 0.0
    }

    fn request(&self) -> SynthesisRequest {
        SynthesisRequest::new(self.text.clone())
            .language(self.language)
            .speed(self.speed)
            .pitch(self.pitch)
    }
}

fn clamp_or(v: f32, range: RangeInclusive<f32>, fallback: f32) -> f32 {
    if v.is_finite() {
        v.clamp(*range.start(), *range.end())
    } else {
        fallback
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifacts {
    pub wav: PathBuf,
    pub mp3: Option<PathBuf>,
    pub waveform: PathBuf,
}

#[derive(Debug)]
pub struct EngineOutput {
    pub engine: EngineKind,
    pub audio: AudioBuffer,
    pub artifacts: Artifacts,
}

#[derive(Debug, Default)]
pub struct Report {
    pub outputs: Vec<EngineOutput>,
    pub notices: Vec<Notice>,
}

impl Report {
    /// `None` when the primary engine failed.
    pub fn primary(&self) -> Option<&EngineOutput> {
        self.outputs.first()
    }

    fn notice(&mut self, notice: Notice) {
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
    }
}

pub struct Session {
    engines: EngineSet,
    lossy: LossyEncoder,
    out_dir: PathBuf,
}

impl Session {
    pub fn new(engines: EngineSet, lossy: LossyEncoder, out_dir: PathBuf) -> Self {
        Self {
            engines,
            lossy,
            out_dir,
        }
    }

    pub async fn speak(
        &mut self,
        primary: EngineKind,
        compare: Option<EngineKind>,
        opts: &SpeakOptions,
    ) -> Result<Report> {
        if opts.text.trim().is_empty() {
            return Err(TtsError::InvalidArgument(
                "Please enter some text to synthesize".to_string(),
            ));
        }
        let mut report = Report::default();
        if opts.has_prosody() {
            report.notice(Notice::Info(
                "Speed/Pitch may be ignored by the selected engine".to_string(),
            ));
        }

        let Some(audio) = self.synthesize_with_engine(primary, opts, &mut report).await else {
            report.notice(Notice::Error(
                "Primary engine failed to generate speech".to_string(),
            ));
            return Ok(report);
        };
        let artifacts = self.create_artifacts(primary.code(), &audio, &mut report)?;
        report.outputs.push(EngineOutput {
            engine: primary,
            audio,
            artifacts,
        });

        if let Some(second) = compare {
            match self.synthesize_with_engine(second, opts, &mut report).await {
                Some(audio) => {
                    let stem = if second == primary {
                        format!("{}_compare", second.code())
                    } else {
                        second.code().to_string()
                    };
                    let artifacts = self.create_artifacts(&stem, &audio, &mut report)?;
                    report.outputs.push(EngineOutput {
                        engine: second,
                        audio,
                        artifacts,
                    });
                }
                None => report.notice(Notice::Warning(
                    "Secondary engine failed, showing primary result only".to_string(),
                )),
            }
        }
        Ok(report)
    }

    /// Construct (or reuse) the engine and synthesize. Failures are turned
    /// into notices for the user.
    async fn synthesize_with_engine(
        &mut self,
        kind: EngineKind,
        opts: &SpeakOptions,
        report: &mut Report,
    ) -> Option<AudioBuffer> {
        let result = match self.engines.get(kind) {
            Ok(engine) => engine.synthesize(&opts.request()).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(audio) => {
                info!(
                    target: "tts_mini",
                    engine = %kind,
                    duration_secs = audio.duration_secs(),
                    sample_rate = audio.sample_rate,
                    "Synthesized"
                );
                Some(audio)
            }
            Err(e) => {
                warn!(target: "tts_mini", engine = %kind, error = %e, "Synthesis failed");
                report.notice(match e {
                    TtsError::EnvironmentUnsupported(msg) => {
                        Notice::Warning(format!("{msg}. Skipping..."))
                    }
                    TtsError::MissingCredential(msg) => Notice::Error(msg),
                    other => Notice::Error(format!(
                        "Synthesis failed with {}: {}",
                        kind.label(),
                        other
                    )),
                });
                None
            }
        }
    }

    fn create_artifacts(
        &self,
        stem: &str,
        audio: &AudioBuffer,
        report: &mut Report,
    ) -> Result<Artifacts> {
        let (samples, rate) = (&audio.samples, audio.sample_rate);
        let wav = write_lossless(samples, rate, self.out_dir.join(format!("{stem}.wav")))?;
        let mp3 = match self
            .lossy
            .encode(samples, rate, self.out_dir.join(format!("{stem}.mp3")))
        {
            Ok(path) => Some(path),
            Err(TtsError::FeatureUnavailable(msg)) => {
                report.notice(Notice::Info(msg));
                None
            }
            Err(e) => {
                report.notice(Notice::Warning(format!("MP3 export failed: {e}")));
                None
            }
        };
        let waveform =
            plot_waveform(samples, rate, self.out_dir.join(format!("{stem}_waveform.png")))?;
        Ok(Artifacts { wav, mp3, waveform })
    }
}
