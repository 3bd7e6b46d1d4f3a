use super::AudioSource;
use crate::config::PollInterval;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

const NOISE_SEED: u64 = 17;

struct Phrase {
    f0_hz: f32,
    amplitude: f32,
    ms: u64,
}

// A looping script of phrases and breaths. Pitch and loudness move
// enough to walk the classifier through several emotional reads.
const SCRIPT: &[Phrase] = &[
    Phrase { f0_hz: 170.0, amplitude: 0.28, ms: 900 },
    Phrase { f0_hz: 0.0, amplitude: 0.0, ms: 250 },
    Phrase { f0_hz: 210.0, amplitude: 0.40, ms: 700 },
    Phrase { f0_hz: 0.0, amplitude: 0.0, ms: 200 },
    Phrase { f0_hz: 255.0, amplitude: 0.55, ms: 800 },
    Phrase { f0_hz: 185.0, amplitude: 0.33, ms: 1000 },
    Phrase { f0_hz: 0.0, amplitude: 0.0, ms: 350 },
    Phrase { f0_hz: 315.0, amplitude: 0.62, ms: 600 },
    Phrase { f0_hz: 140.0, amplitude: 0.20, ms: 1100 },
    Phrase { f0_hz: 0.0, amplitude: 0.0, ms: 300 },
];

/// Deterministic spoken-voice stand-in for demos and machines without
/// a microphone. Voiced phrases carry a fundamental plus two
/// harmonics and a little seeded breath noise.
pub struct SynthSource {
    sample_rate_hz: u32,
    chunk_len: usize,
    phase: f32,
    script_pos: usize,
    phrase_elapsed: usize,
    rng: StdRng,
}

impl SynthSource {
    pub fn new(sample_rate_hz: u32, poll: PollInterval) -> Self {
        Self {
            sample_rate_hz,
            chunk_len: poll.samples_for_rate(sample_rate_hz),
            phase: 0.0,
            script_pos: 0,
            phrase_elapsed: 0,
            rng: StdRng::seed_from_u64(NOISE_SEED),
        }
    }

    fn phrase_len(&self) -> usize {
        let phrase = &SCRIPT[self.script_pos];
        (phrase.ms * u64::from(self.sample_rate_hz) / 1000) as usize
    }

    fn next_sample(&mut self) -> f32 {
        let phrase = &SCRIPT[self.script_pos];
        let phrase_len = self.phrase_len();

        let sample = if phrase.f0_hz > 0.0 {
            // Short attack/release ramps keep phrase edges click-free.
            let ramp = (self.sample_rate_hz / 100).max(1) as usize;
            let edge = self.phrase_elapsed.min(phrase_len.saturating_sub(self.phrase_elapsed));
            let envelope = (edge as f32 / ramp as f32).min(1.0);

            let voiced = 0.6 * self.phase.sin()
                + 0.3 * (2.0 * self.phase).sin()
                + 0.15 * (3.0 * self.phase).sin();
            let breath = 0.02 * self.rng.random_range(-1.0f32..1.0);
            phrase.amplitude * envelope * voiced + breath
        } else {
            0.01 * self.rng.random_range(-1.0f32..1.0)
        };

        self.phase += 2.0 * std::f32::consts::PI * phrase.f0_hz / self.sample_rate_hz as f32;
        if self.phase > 2.0 * std::f32::consts::PI {
            self.phase -= 2.0 * std::f32::consts::PI;
        }

        self.phrase_elapsed += 1;
        if self.phrase_elapsed >= phrase_len {
            self.phrase_elapsed = 0;
            self.script_pos = (self.script_pos + 1) % SCRIPT.len();
        }
        sample
    }
}

impl AudioSource for SynthSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }

    fn read_chunk(&mut self) -> Option<Vec<f32>> {
        Some((0..self.chunk_len).map(|_| self.next_sample()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_500ms() -> PollInterval {
        PollInterval::new(500).expect("nonzero")
    }

    #[test]
    fn same_construction_same_audio() {
        let mut a = SynthSource::new(DEFAULT_SAMPLE_RATE, poll_500ms());
        let mut b = SynthSource::new(DEFAULT_SAMPLE_RATE, poll_500ms());
        assert_eq!(a.read_chunk(), b.read_chunk());
        assert_eq!(a.read_chunk(), b.read_chunk());
    }

    #[test]
    fn chunks_are_poll_sized() {
        let mut s = SynthSource::new(16_000, poll_500ms());
        let chunk = s.read_chunk().expect("synth never runs dry");
        assert_eq!(chunk.len(), 8_000);
    }

    #[test]
    fn samples_stay_in_range() {
        let mut s = SynthSource::new(DEFAULT_SAMPLE_RATE, poll_500ms());
        for _ in 0..50 {
            let chunk = s.read_chunk().expect("synth never runs dry");
            assert!(chunk.iter().all(|v| v.abs() <= 1.0));
        }
    }
}
