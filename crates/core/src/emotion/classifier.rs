use super::{AudioFeatures, Emotion};
use crate::util::window::FeatureWindow;

// Ratios are against the rolling history average, which already
// includes the frame being classified.
const EXCITED_PITCH_RATIO: f32 = 1.2;
const EXCITED_ENERGY_RATIO: f32 = 1.3;
const EXCITED_MIN_RATE: u32 = 3;
const HAPPY_PITCH_RATIO: f32 = 1.15;
const HAPPY_ENERGY_RATIO: f32 = 1.1;
const SAD_PITCH_RATIO: f32 = 0.85;
const SAD_ENERGY_RATIO: f32 = 0.8;
const SAD_MAX_RATE: u32 = 2;
const ANXIOUS_MIN_VARIATION: f32 = 50.0;
const ANXIOUS_ENERGY_RATIO: f32 = 1.2;
const CALM_ENERGY_RATIO: f32 = 0.9;
const CALM_MAX_VARIATION: f32 = 30.0;

const CONFIDENT_MIN_ENERGY: f32 = 20.0;
const CONFIDENT_MIN_PITCH_HZ: f32 = 50.0;

/// Mean absolute change between successive pitch samples. High values
/// mean an unsteady voice.
pub fn pitch_variation(pitch_window: &FeatureWindow) -> f32 {
    pitch_window.mean_abs_delta()
}

/// Maps the current frame against its rolling history. Rules are
/// checked in order and the first match wins, so excited shadows happy
/// and sad shadows calm.
pub fn classify(
    features: AudioFeatures,
    pitch_window: &FeatureWindow,
    energy_window: &FeatureWindow,
) -> Emotion {
    let avg_pitch = pitch_window.mean();
    let avg_energy = energy_window.mean();
    let variation = pitch_variation(pitch_window);
    let pitch = features.pitch_hz;
    let energy = features.energy;
    let rate = features.speech_rate;

    if pitch > avg_pitch * EXCITED_PITCH_RATIO
        && energy > avg_energy * EXCITED_ENERGY_RATIO
        && rate > EXCITED_MIN_RATE
    {
        return Emotion::Excited;
    }
    if pitch > avg_pitch * HAPPY_PITCH_RATIO && energy > avg_energy * HAPPY_ENERGY_RATIO {
        return Emotion::Happy;
    }
    if pitch < avg_pitch * SAD_PITCH_RATIO
        && energy < avg_energy * SAD_ENERGY_RATIO
        && rate < SAD_MAX_RATE
    {
        return Emotion::Sad;
    }
    if variation > ANXIOUS_MIN_VARIATION && energy > avg_energy * ANXIOUS_ENERGY_RATIO {
        return Emotion::Anxious;
    }
    if energy < avg_energy * CALM_ENERGY_RATIO && variation < CALM_MAX_VARIATION {
        return Emotion::Calm;
    }
    Emotion::Neutral
}

/// Two-level confidence: 0.75 once the frame clearly carries voiced
/// audio, 0.5 otherwise.
pub fn confidence_for(features: &AudioFeatures) -> f32 {
    if features.energy > CONFIDENT_MIN_ENERGY && features.pitch_hz > CONFIDENT_MIN_PITCH_HZ {
        0.75
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(values: &[f32]) -> FeatureWindow {
        let mut w = FeatureWindow::new(10);
        for v in values {
            w.push(*v);
        }
        w
    }

    /// Nine frames at `base` followed by one at `last`, the shape most
    /// rules are easiest to probe with.
    fn steady_then(base: f32, last: f32) -> FeatureWindow {
        let mut w = FeatureWindow::new(10);
        for _ in 0..9 {
            w.push(base);
        }
        w.push(last);
        w
    }

    fn features(pitch_hz: f32, energy: f32, speech_rate: u32) -> AudioFeatures {
        AudioFeatures {
            pitch_hz,
            energy,
            speech_rate,
        }
    }

    #[test]
    fn excited_needs_pitch_energy_and_rate() {
        let pitches = steady_then(100.0, 200.0);
        let energies = steady_then(10.0, 30.0);
        let e = classify(features(200.0, 30.0, 4), &pitches, &energies);
        assert_eq!(e, Emotion::Excited);
    }

    #[test]
    fn excited_falls_back_to_happy_without_rate() {
        // Same frame as the excited case but speech rate at the
        // threshold, not above it.
        let pitches = steady_then(100.0, 200.0);
        let energies = steady_then(10.0, 30.0);
        let e = classify(features(200.0, 30.0, 3), &pitches, &energies);
        assert_eq!(e, Emotion::Happy);
    }

    #[test]
    fn happy_on_moderately_raised_voice() {
        let pitches = steady_then(100.0, 130.0);
        let energies = steady_then(10.0, 12.0);
        let e = classify(features(130.0, 12.0, 0), &pitches, &energies);
        assert_eq!(e, Emotion::Happy);
    }

    #[test]
    fn sad_needs_low_pitch_energy_and_rate() {
        let pitches = steady_then(100.0, 60.0);
        let energies = steady_then(10.0, 5.0);
        let e = classify(features(60.0, 5.0, 1), &pitches, &energies);
        assert_eq!(e, Emotion::Sad);
    }

    #[test]
    fn sad_without_slow_rate_lands_calm() {
        let pitches = steady_then(100.0, 60.0);
        let energies = steady_then(10.0, 5.0);
        let e = classify(features(60.0, 5.0, 2), &pitches, &energies);
        assert_eq!(e, Emotion::Calm);
    }

    #[test]
    fn anxious_on_jittery_pitch_with_raised_energy() {
        let pitches = window_of(&[
            250.0, 100.0, 250.0, 100.0, 250.0, 100.0, 250.0, 100.0, 250.0, 100.0,
        ]);
        let energies = steady_then(10.0, 15.0);
        let e = classify(features(100.0, 15.0, 0), &pitches, &energies);
        assert_eq!(e, Emotion::Anxious);
    }

    #[test]
    fn calm_on_soft_stable_voice() {
        let pitches = window_of(&[100.0; 10]);
        let energies = steady_then(10.0, 8.0);
        let e = classify(features(100.0, 8.0, 0), &pitches, &energies);
        assert_eq!(e, Emotion::Calm);
    }

    #[test]
    fn steady_identical_frames_are_neutral() {
        // Calm needs energy strictly below 0.9x the average, which a
        // flat history never satisfies.
        let pitches = window_of(&[100.0; 10]);
        let energies = window_of(&[10.0; 10]);
        let e = classify(features(100.0, 10.0, 0), &pitches, &energies);
        assert_eq!(e, Emotion::Neutral);
    }

    #[test]
    fn confidence_requires_both_energy_and_pitch() {
        assert_eq!(confidence_for(&features(60.0, 25.0, 0)), 0.75);
        assert_eq!(confidence_for(&features(50.0, 25.0, 0)), 0.5);
        assert_eq!(confidence_for(&features(60.0, 20.0, 0)), 0.5);
        assert_eq!(confidence_for(&features(0.0, 0.0, 0)), 0.5);
    }
}
