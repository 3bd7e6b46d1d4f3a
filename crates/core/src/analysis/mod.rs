use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::{collections::VecDeque, sync::Arc};

/// Transform length. Everything downstream (bin count, byte frame
/// length, autocorrelation lags) is derived from it.
pub const FFT_SIZE: usize = 2048;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

// Calibration of the byte views, matching Web Audio `AnalyserNode`
// defaults so the thresholds tuned in the browser keep working.
const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

const BLACKMAN_ALPHA: f32 = 0.16;

/// Rolling spectrum view over the most recent [`FFT_SIZE`] samples.
///
/// Frequency-domain reads are smoothed against the previous read, so
/// the analyzer is stateful in both the sample window and the
/// spectrum.
pub struct SpectrumAnalyzer {
    sample_rate_hz: u32,
    window: VecDeque<f32>,
    blackman: Vec<f32>,
    smoothed: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate_hz: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let blackman = (0..FFT_SIZE)
            .map(|n| {
                let phase = 2.0 * std::f32::consts::PI * n as f32 / FFT_SIZE as f32;
                let a0 = (1.0 - BLACKMAN_ALPHA) / 2.0;
                let a1 = 0.5;
                let a2 = BLACKMAN_ALPHA / 2.0;
                a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
            })
            .collect();
        Self {
            sample_rate_hz,
            window: VecDeque::from(vec![0.0; FFT_SIZE]),
            blackman,
            smoothed: vec![0.0; BIN_COUNT],
            fft,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Slides the window forward. Only the most recent [`FFT_SIZE`]
    /// samples are retained.
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &s in samples {
            self.window.push_back(s);
        }
        while self.window.len() > FFT_SIZE {
            self.window.pop_front();
        }
    }

    /// Byte view of the waveform: the oldest [`BIN_COUNT`] samples of
    /// the window mapped through `128 * (1 + x)`, clamped to `0..=255`.
    pub fn byte_time_domain_data(&self) -> Vec<u8> {
        self.window
            .iter()
            .take(BIN_COUNT)
            .map(|&x| (128.0 * (1.0 + x)).floor().clamp(0.0, 255.0) as u8)
            .collect()
    }

    /// Byte view of the spectrum: Blackman window, forward FFT,
    /// `1/N`-scaled magnitudes smoothed against the previous read,
    /// then mapped from `[-100, -30]` dB onto `0..=255`.
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        let mut buffer: Vec<Complex<f32>> = self
            .window
            .iter()
            .zip(self.blackman.iter())
            .map(|(&x, &w)| Complex::new(x * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let scale = 1.0 / FFT_SIZE as f32;
        let byte_per_db = 255.0 / (MAX_DECIBELS - MIN_DECIBELS);
        let mut out = Vec::with_capacity(BIN_COUNT);
        for (bin, slot) in buffer.iter().take(BIN_COUNT).zip(self.smoothed.iter_mut()) {
            let magnitude = bin.norm() * scale;
            *slot = SMOOTHING_TIME_CONSTANT * *slot
                + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;
            if *slot <= 0.0 {
                out.push(0);
                continue;
            }
            let db = 20.0 * slot.log10();
            let byte = (byte_per_db * (db - MIN_DECIBELS)).floor().clamp(0.0, 255.0);
            out.push(byte as u8);
        }
        out
    }
}
