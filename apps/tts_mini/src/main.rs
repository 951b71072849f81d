mod cli;
mod config;
mod preflight;
mod session;

use clap::Parser;
use cli::{parse_engine, parse_language, Cli, Command, SpeakArgs};
use config::AppConfig;
use session::{Notice, Report, Session, SpeakOptions};
use tracing::info;
use tts_mini_core::EngineSet;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing (stderr, so stdout stays the command's output)
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "info,tts_mini_core=info,tts_mini_audio=info,tts_mini=info".to_string()
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    // Defaults + env + optional TOML overlay
    let cfg = AppConfig::load();

    match cli.command {
        Command::Speak(args) => {
            let code = run_speak(args, cfg).await;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Command::Engines => {
            let set = EngineSet::new(cfg.engines, cfg.default_language);
            for kind in set.available() {
                println!("{:<16} {}", kind.label(), kind.code());
            }
        }
        Command::Preflight => {
            println!("TTS Mini - Preflight Check");
            let checks = preflight::run(&cfg);
            for check in &checks {
                println!("{check}");
            }
            if checks.iter().any(|c| c.status == preflight::Status::Fail) {
                std::process::exit(1);
            }
            println!("Environment is ready.");
        }
    }
    Ok(())
}

/// Exit code for `speak`: 0 when the primary engine produced output.
async fn run_speak(args: SpeakArgs, cfg: AppConfig) -> i32 {
    match speak(args, cfg).await {
        Ok(report) => {
            print_report(&report);
            if report.primary().is_some() {
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

async fn speak(args: SpeakArgs, cfg: AppConfig) -> tts_mini_core::Result<Report> {
    let primary = match args.engine.as_deref() {
        Some(s) => parse_engine(s)?,
        None => cfg.default_engine,
    };
    let compare = args.compare.as_deref().map(parse_engine).transpose()?;
    let language = match args.language.as_deref() {
        Some(s) => parse_language(s)?,
        None => cfg.default_language,
    };
    let out_dir = args.out_dir.unwrap_or(cfg.out_dir);
    let opts = SpeakOptions::new(args.text, language, args.speed, args.pitch);

    info!(
        target: "tts_mini",
        engine = %primary,
        compare = ?compare,
        language = %language,
        out_dir = %out_dir.display(),
        "Generating speech"
    );
    let engines = EngineSet::new(cfg.engines, language);
    Session::new(engines, cfg.lossy, out_dir)
        .speak(primary, compare, &opts)
        .await
}

fn print_report(report: &Report) {
    for notice in &report.notices {
        match notice {
            Notice::Info(m) => eprintln!("info: {m}"),
            Notice::Warning(m) => eprintln!("warning: {m}"),
            Notice::Error(m) => eprintln!("error: {m}"),
        }
    }
    for out in &report.outputs {
        println!(
            "{} result: {:.2} s @ {} Hz",
            out.engine.label(),
            out.audio.duration_secs(),
            out.audio.sample_rate
        );
        println!("  WAV:      {}", out.artifacts.wav.display());
        match &out.artifacts.mp3 {
            Some(p) => println!("  MP3:      {}", p.display()),
            None => println!("  MP3:      (not available)"),
        }
        println!("  Waveform: {}", out.artifacts.waveform.display());
    }
}
