use crate::analysis::SpectrumAnalyzer;
use crate::emotion::{self, AudioFeatures, EmotionReading};
use crate::source::AudioSource;
use crate::util::window::FeatureWindow;

/// Frames of pitch/energy history kept for classification.
pub const HISTORY_LEN: usize = 10;

/// Energy peaks must clear this multiple of the history average to
/// count toward the speech rate.
const SPEECH_PEAK_RATIO: f32 = 1.2;

#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("audio source reports a zero sample rate")]
    ZeroSampleRate,
}

struct ActiveInput {
    source: Box<dyn AudioSource>,
    analyzer: SpectrumAnalyzer,
}

/// Polls an audio source and turns each poll into an emotion reading.
///
/// The detector is deliberately forgiving: before [`initialize`] and
/// after [`cleanup`] every poll reports a neutral, low-confidence
/// reading instead of failing, so callers can keep a UI loop running
/// while audio comes and goes.
///
/// [`initialize`]: EmotionDetector::initialize
/// [`cleanup`]: EmotionDetector::cleanup
pub struct EmotionDetector {
    active: Option<ActiveInput>,
    pitch_history: FeatureWindow,
    energy_history: FeatureWindow,
}

impl EmotionDetector {
    pub fn new() -> Self {
        Self {
            active: None,
            pitch_history: FeatureWindow::new(HISTORY_LEN),
            energy_history: FeatureWindow::new(HISTORY_LEN),
        }
    }

    /// Binds an audio source, replacing any previous one. Feature
    /// histories carry over so a device swap mid-session does not
    /// reset the emotional baseline.
    pub fn initialize(&mut self, source: Box<dyn AudioSource>) -> Result<(), DetectorError> {
        let sample_rate_hz = source.sample_rate();
        if sample_rate_hz == 0 {
            return Err(DetectorError::ZeroSampleRate);
        }
        tracing::debug!(sample_rate_hz, "initializing audio analysis");
        self.active = Some(ActiveInput {
            analyzer: SpectrumAnalyzer::new(sample_rate_hz),
            source,
        });
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// One poll: pull pending audio, extract features, classify.
    ///
    /// A source with nothing to give leaves the analysis window as it
    /// was, so readings decay through the spectrum smoothing rather
    /// than dropping to silence instantly.
    pub fn analyze_emotion(&mut self) -> EmotionReading {
        let Some(active) = self.active.as_mut() else {
            return EmotionReading::silent();
        };
        if let Some(chunk) = active.source.read_chunk() {
            active.analyzer.push_samples(&chunk);
        }
        let spectrum = active.analyzer.byte_frequency_data();
        let waveform = active.analyzer.byte_time_domain_data();
        let sample_rate_hz = active.analyzer.sample_rate();
        self.ingest_frame(&spectrum, &waveform, sample_rate_hz)
    }

    /// Releases the audio source and forgets all history.
    pub fn cleanup(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("releasing audio input");
        }
        self.pitch_history.clear();
        self.energy_history.clear();
    }

    fn ingest_frame(
        &mut self,
        spectrum: &[u8],
        waveform: &[u8],
        sample_rate_hz: u32,
    ) -> EmotionReading {
        let energy = byte_mean(spectrum);
        let pitch_hz = detect_pitch(waveform, sample_rate_hz);

        self.pitch_history.push(pitch_hz);
        self.energy_history.push(energy);

        let peak_threshold = self.energy_history.mean() * SPEECH_PEAK_RATIO;
        let speech_rate = self.energy_history.peaks_above(peak_threshold) as u32;

        let features = AudioFeatures {
            pitch_hz,
            energy,
            speech_rate,
        };
        let emotion = emotion::classify(features, &self.pitch_history, &self.energy_history);
        let confidence = emotion::confidence_for(&features);
        tracing::debug!(%emotion, confidence, pitch_hz, energy, speech_rate, "analyzed frame");
        EmotionReading {
            emotion,
            confidence,
            features,
        }
    }
}

impl Default for EmotionDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn byte_mean(bytes: &[u8]) -> f32 {
    if bytes.is_empty() {
        return 0.0;
    }
    let sum: u32 = bytes.iter().map(|&b| u32::from(b)).sum();
    sum as f32 / bytes.len() as f32
}

/// Pitch via the lag that maximizes the summed absolute difference
/// between the waveform and its shifted copy.
///
/// A conventional autocorrelation would minimize that difference; the
/// maximum lands on the half-period, so clean tones read an octave
/// above their fundamental. Every classifier threshold is tuned
/// against readings with this bias. Do not correct it in isolation.
fn detect_pitch(waveform: &[u8], sample_rate_hz: u32) -> f32 {
    let half = waveform.len() / 2;
    let mut max_difference = 0u32;
    let mut best_lag = 0usize;
    for lag in 0..half {
        let mut difference = 0u32;
        for i in 0..half {
            difference += u32::from(waveform[i].abs_diff(waveform[i + lag]));
        }
        if difference > max_difference {
            max_difference = difference;
            best_lag = lag;
        }
    }
    if best_lag > 0 {
        sample_rate_hz as f32 / best_lag as f32
    } else {
        0.0
    }
}
