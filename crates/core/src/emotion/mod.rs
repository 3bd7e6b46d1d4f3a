mod classifier;

use crate::config::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use classifier::{classify, confidence_for, pitch_variation};

/// Emotional states the detector can report.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Anxious,
    Excited,
    Calm,
}

impl Emotion {
    /// Every state in a fixed order, for stable iteration in summaries
    /// and display tables.
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Anxious,
        Emotion::Excited,
        Emotion::Calm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Anxious => "anxious",
            Self::Excited => "excited",
            Self::Calm => "calm",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Neutral => "😐",
            Self::Happy => "😊",
            Self::Sad => "😢",
            Self::Anxious => "😰",
            Self::Excited => "🤗",
            Self::Calm => "😌",
        }
    }

    /// Human-readable label in the session's display language.
    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::EnUs => match self {
                Self::Neutral => "Neutral",
                Self::Happy => "Happy",
                Self::Sad => "Sad",
                Self::Anxious => "Anxious",
                Self::Excited => "Excited",
                Self::Calm => "Calm",
            },
            Language::HiIn => match self {
                Self::Neutral => "सामान्य",
                Self::Happy => "खुश",
                Self::Sad => "उदास",
                Self::Anxious => "चिंतित",
                Self::Excited => "उत्साहित",
                Self::Calm => "शांत",
            },
        }
    }

    /// Guidance for a downstream companion on how to speak to someone
    /// in this state.
    pub fn tone_guidance(&self) -> &'static str {
        match self {
            Self::Sad => {
                "comforting, understanding, and supportive. Acknowledge their feelings and offer gentle encouragement"
            }
            Self::Happy => "warm and celebratory. Share in their joy and positivity",
            Self::Anxious => {
                "calm, reassuring, and patient. Help them feel safe and understood"
            }
            Self::Excited => {
                "enthusiastic and engaged. Match their energy while keeping them grounded"
            }
            Self::Calm => "peaceful and reflective. Maintain a soothing presence",
            Self::Neutral => {
                "warm and welcoming. Be ready to adapt to their emotional needs"
            }
        }
    }
}

impl Default for Emotion {
    fn default() -> Self {
        Self::Neutral
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prosody measurements extracted from one polled frame.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioFeatures {
    #[serde(rename = "pitch")]
    pub pitch_hz: f32,
    pub energy: f32,
    #[serde(rename = "speechRate")]
    pub speech_rate: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionReading {
    pub emotion: Emotion,
    pub confidence: f32,
    pub features: AudioFeatures,
}

impl EmotionReading {
    /// The reading reported before `initialize` and after `cleanup`.
    /// Confidence is zero: there was no signal to judge at all.
    pub fn silent() -> Self {
        Self {
            emotion: Emotion::Neutral,
            confidence: 0.0,
            features: AudioFeatures::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emotion_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Emotion::Anxious).unwrap(), json!("anxious"));
        assert_eq!(serde_json::to_value(Emotion::Neutral).unwrap(), json!("neutral"));
    }

    #[test]
    fn reading_wire_shape_matches_browser_client() {
        let reading = EmotionReading {
            emotion: Emotion::Happy,
            confidence: 0.75,
            features: AudioFeatures {
                pitch_hz: 220.0,
                energy: 42.0,
                speech_rate: 3,
            },
        };
        let v = serde_json::to_value(reading).unwrap();
        assert_eq!(v["emotion"], json!("happy"));
        assert_eq!(v["features"]["pitch"], json!(220.0));
        assert_eq!(v["features"]["speechRate"], json!(3));
    }

    #[test]
    fn labels_cover_both_languages() {
        assert_eq!(Emotion::Excited.label(Language::EnUs), "Excited");
        assert_eq!(Emotion::Excited.label(Language::HiIn), "उत्साहित");
        assert_eq!(Emotion::Calm.label(Language::HiIn), "शांत");
    }

    // The companion service splices these fragments into its system
    // prompt ("Adjust your tone to be especially {guidance}."), so the
    // exact wording is load-bearing.
    #[test]
    fn tone_guidance_covers_every_state() {
        assert_eq!(
            Emotion::Sad.tone_guidance(),
            "comforting, understanding, and supportive. Acknowledge their feelings and offer gentle encouragement"
        );
        assert_eq!(
            Emotion::Happy.tone_guidance(),
            "warm and celebratory. Share in their joy and positivity"
        );
        assert_eq!(
            Emotion::Anxious.tone_guidance(),
            "calm, reassuring, and patient. Help them feel safe and understood"
        );
        assert_eq!(
            Emotion::Excited.tone_guidance(),
            "enthusiastic and engaged. Match their energy while keeping them grounded"
        );
        assert_eq!(
            Emotion::Calm.tone_guidance(),
            "peaceful and reflective. Maintain a soothing presence"
        );
        assert_eq!(
            Emotion::Neutral.tone_guidance(),
            "warm and welcoming. Be ready to adapt to their emotional needs"
        );
    }

    #[test]
    fn silent_reading_is_neutral_with_zero_confidence() {
        let r = EmotionReading::silent();
        assert_eq!(r.emotion, Emotion::Neutral);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.features.pitch_hz, 0.0);
        assert_eq!(r.features.energy, 0.0);
        assert_eq!(r.features.speech_rate, 0);
    }
}
