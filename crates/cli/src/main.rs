#![deny(warnings)]

use anyhow::Context;
use clap::{ArgGroup, Parser};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use voice_emotion_core::config::{
    resolve_optional_string, resolve_string_with_default, AppConfig, Env, InputSource, Language,
    PollInterval, StdEnv, DEFAULT_LANGUAGE, DEFAULT_POLL_MS, ENV_INPUT_DEVICE, ENV_LANGUAGE,
};
use voice_emotion_core::detector::EmotionDetector;
use voice_emotion_core::emotion::{Emotion, EmotionReading};
use voice_emotion_core::session::{
    EmotionSink, ListeningSession, SessionConfig, SessionSummary, SinkError,
};
#[cfg(feature = "mic")]
use voice_emotion_core::source::mic::MicSource;
use voice_emotion_core::source::synth::{SynthSource, DEFAULT_SAMPLE_RATE};
use voice_emotion_core::source::wav::WavSource;
use voice_emotion_core::source::AudioSource;

#[derive(Parser, Debug)]
#[command(name = "voice-emotion")]
#[command(about = "Real-time vocal emotion readings from a microphone, WAV file, or synthetic voice")]
#[command(group(
    ArgGroup::new("input")
        .required(false)
        .multiple(false)
        .args(["mic", "synth", "wav"])
))]
struct Args {
    /// Listen on a microphone (the default input).
    #[arg(long)]
    mic: bool,

    /// Use the built-in synthetic voice; needs no hardware.
    #[arg(long)]
    synth: bool,

    /// Replay a WAV file.
    #[arg(long)]
    wav: Option<String>,

    /// Input device name for --mic; the default device when unset.
    #[arg(long, env = ENV_INPUT_DEVICE)]
    device: Option<String>,

    #[arg(long, default_value_t = DEFAULT_POLL_MS)]
    poll_ms: u64,

    /// Stop after this many seconds; run until Ctrl-C when unset.
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Label language: en-US or hi-IN.
    #[arg(long, env = ENV_LANGUAGE, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Emit readings and the final summary as JSON lines.
    #[arg(long)]
    json: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let json = args.json;
    let cfg = build_config(args, &env)?;

    tracing::info!(
        input = ?cfg.input,
        language = %cfg.language,
        poll_ms = cfg.poll.ms,
        "config loaded"
    );

    run_session(cfg, json).await
}

async fn run_session(cfg: AppConfig, json: bool) -> anyhow::Result<()> {
    let mut detector = EmotionDetector::new();
    detector.initialize(build_source(&cfg)?)?;

    let session = ListeningSession::new(detector, SessionConfig::from_app(&cfg));
    let sink = ConsoleSink {
        language: cfg.language,
        json,
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    let max_duration = cfg.max_duration;
    tokio::spawn(async move {
        wait_for_stop(max_duration).await;
        let _ = stop_tx.send(true);
    });

    let summary = session.run(&sink, stop_rx).await;
    report_summary(&summary, cfg.language, json)?;
    Ok(())
}

fn build_source(cfg: &AppConfig) -> anyhow::Result<Box<dyn AudioSource>> {
    match &cfg.input {
        InputSource::Synth => Ok(Box::new(SynthSource::new(DEFAULT_SAMPLE_RATE, cfg.poll))),
        InputSource::Wav(path) => Ok(Box::new(WavSource::open(path, cfg.poll)?)),
        InputSource::Mic => open_mic(cfg),
    }
}

#[cfg(feature = "mic")]
fn open_mic(cfg: &AppConfig) -> anyhow::Result<Box<dyn AudioSource>> {
    Ok(Box::new(MicSource::open(cfg.input_device.as_deref())?))
}

#[cfg(not(feature = "mic"))]
fn open_mic(_cfg: &AppConfig) -> anyhow::Result<Box<dyn AudioSource>> {
    anyhow::bail!(
        "microphone support was compiled out; use --synth or --wav, or rebuild with the `mic` feature"
    )
}

async fn wait_for_stop(max_duration: Option<Duration>) {
    match max_duration {
        Some(limit) => {
            tokio::select! {
                _ = tokio::time::sleep(limit) => {
                    tracing::info!(seconds = limit.as_secs(), "duration reached, stopping");
                }
                result = tokio::signal::ctrl_c() => log_interrupt(result),
            }
        }
        None => log_interrupt(tokio::signal::ctrl_c().await),
    }
}

fn log_interrupt(result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::info!("interrupt received, stopping"),
        Err(e) => tracing::warn!(error = %e, "failed to listen for interrupt, stopping"),
    }
}

struct ConsoleSink {
    language: Language,
    json: bool,
}

impl EmotionSink for ConsoleSink {
    fn publish(&self, reading: EmotionReading) -> BoxFuture<'_, Result<(), SinkError>> {
        async move {
            if self.json {
                let line = serde_json::to_string(&reading)
                    .map_err(|e| SinkError::Io(e.into()))?;
                println!("{line}");
            } else {
                println!(
                    "{} {:<10} confidence {:.2}  pitch {:>7.1} Hz  energy {:>5.1}  rate {}",
                    reading.emotion.emoji(),
                    reading.emotion.label(self.language),
                    reading.confidence,
                    reading.features.pitch_hz,
                    reading.features.energy,
                    reading.features.speech_rate
                );
            }
            Ok(())
        }
        .boxed()
    }
}

fn report_summary(summary: &SessionSummary, language: Language, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }
    println!();
    println!("session summary: {} polls", summary.polls);
    for emotion in Emotion::ALL {
        let Some(&count) = summary.counts.get(&emotion) else {
            continue;
        };
        println!("  {} {:<10} {count}", emotion.emoji(), emotion.label(language));
    }
    if let Some(dominant) = summary.dominant() {
        println!("mostly {} {}", dominant.emoji(), dominant.label(language));
        println!("suggested reply tone: {}", dominant.tone_guidance());
    }
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let input = match (args.mic, args.synth, args.wav) {
        (_, false, None) => InputSource::Mic,
        (false, true, None) => InputSource::Synth,
        (false, false, Some(path)) => InputSource::Wav(path),
        _ => anyhow::bail!("choose at most one of --mic, --synth, or --wav"),
    };

    let language_tag =
        resolve_string_with_default(Some(args.language), ENV_LANGUAGE, env, DEFAULT_LANGUAGE);
    let language = Language::parse(&language_tag)?;
    let poll = PollInterval::new(args.poll_ms)?;
    let input_device = resolve_optional_string(args.device, ENV_INPUT_DEVICE, env);

    Ok(AppConfig {
        input,
        input_device,
        language,
        poll,
        max_duration: args.duration_secs.map(Duration::from_secs),
    })
}
