use std::collections::VecDeque;

/// Fixed-capacity rolling window of feature samples.
///
/// Insertion-ordered; pushing beyond capacity evicts the oldest sample
/// first. The statistics are the ones the estimator reads every poll; all
/// of them treat an empty window as zero rather than failing.
#[derive(Clone, Debug)]
pub struct FeatureWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl FeatureWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends a sample, returning the evicted oldest sample once the
    /// window is full.
    pub fn push(&mut self, value: f32) -> Option<f32> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);
        evicted
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub fn last(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Arithmetic mean; 0.0 when empty.
    pub fn mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    /// Mean absolute difference between successive samples; 0.0 with
    /// fewer than two samples.
    pub fn mean_abs_delta(&self) -> f32 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let mut sum = 0.0_f32;
        for i in 1..self.samples.len() {
            sum += (self.samples[i] - self.samples[i - 1]).abs();
        }
        sum / (self.samples.len() - 1) as f32
    }

    /// Counts interior samples strictly greater than both neighbors and
    /// greater than `threshold`. Windows shorter than three samples have
    /// no interior and count zero.
    pub fn peaks_above(&self, threshold: f32) -> usize {
        let mut peaks = 0;
        for i in 1..self.samples.len().saturating_sub(1) {
            let v = self.samples[i];
            if v > threshold && v > self.samples[i - 1] && v > self.samples[i + 1] {
                peaks += 1;
            }
        }
        peaks
    }
}
