use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

pub const DEFAULT_POLL_MS: u64 = 500;
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const ENV_INPUT_DEVICE: &str = "VOICE_EMOTION_INPUT_DEVICE";
pub const ENV_LANGUAGE: &str = "VOICE_EMOTION_LANGUAGE";

/// Where a listening session draws its audio from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum InputSource {
    /// Live microphone capture (requires the `mic` feature).
    Mic,
    /// Built-in deterministic voice script; needs no hardware.
    Synth,
    /// A WAV file replayed in poll-sized chunks.
    Wav(String),
}

/// Display language for emotion labels, `en-US` or `hi-IN`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Language {
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "hi-IN")]
    HiIn,
}

impl Language {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "en-US" => Ok(Self::EnUs),
            "hi-IN" => Ok(Self::HiIn),
            other => Err(ConfigError::UnknownLanguage(other.to_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::HiIn => "hi-IN",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::EnUs
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cadence at which a session polls the detector.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollInterval {
    pub ms: u64,
}

impl PollInterval {
    pub fn new(ms: u64) -> Result<Self, ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(Self { ms })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.ms)
    }

    /// Number of mono samples one poll interval spans at `sample_rate_hz`.
    /// Paced sources (synth, WAV replay) size their chunks with this.
    pub fn samples_for_rate(&self, sample_rate_hz: u32) -> usize {
        let sr = u64::from(sample_rate_hz);
        self.ms.saturating_mul(sr).saturating_div(1000) as usize
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self { ms: DEFAULT_POLL_MS }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub input: InputSource,
    pub input_device: Option<String>,
    pub language: Language,
    pub poll: PollInterval,
    pub max_duration: Option<Duration>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("poll interval must be > 0 ms")]
    ZeroPollInterval,
    #[error("unknown language `{0}` (expected en-US or hi-IN)")]
    UnknownLanguage(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}
