use crate::config::{AppConfig, PollInterval};
use crate::detector::EmotionDetector;
use crate::emotion::{Emotion, EmotionReading};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("write reading: {0}")]
    Io(#[from] std::io::Error),
    #[error("reading consumer closed")]
    Closed,
}

/// Receives one reading per poll. Implementations decide what a
/// reading becomes: a console line, a JSON event, a channel send.
pub trait EmotionSink: Send + Sync {
    fn publish(&self, reading: EmotionReading) -> BoxFuture<'_, Result<(), SinkError>>;
}

#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub poll: PollInterval,
}

impl SessionConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self { poll: app.poll }
    }
}

/// What a finished session saw, per emotion.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub polls: u64,
    pub counts: HashMap<Emotion, u64>,
    /// The final reading, the state the speaker was left in.
    pub last: Option<EmotionReading>,
}

impl SessionSummary {
    fn record(&mut self, reading: EmotionReading) {
        self.polls += 1;
        *self.counts.entry(reading.emotion).or_default() += 1;
        self.last = Some(reading);
    }

    /// Most frequent emotion; earlier entries in [`Emotion::ALL`] win
    /// ties so the answer is stable.
    pub fn dominant(&self) -> Option<Emotion> {
        let mut best: Option<(Emotion, u64)> = None;
        for emotion in Emotion::ALL {
            let Some(&count) = self.counts.get(&emotion) else {
                continue;
            };
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((emotion, count));
            }
        }
        best.map(|(emotion, _)| emotion)
    }
}

/// Drives the detector on the poll cadence until told to stop.
///
/// Sink failures are logged and the loop keeps going; a stalled
/// consumer should not end a caregiving session. The detector is
/// always cleaned up on the way out.
pub struct ListeningSession {
    detector: EmotionDetector,
    config: SessionConfig,
}

impl ListeningSession {
    pub fn new(detector: EmotionDetector, config: SessionConfig) -> Self {
        Self { detector, config }
    }

    pub async fn run(
        mut self,
        sink: &dyn EmotionSink,
        mut stop: watch::Receiver<bool>,
    ) -> SessionSummary {
        let mut interval = tokio::time::interval(self.config.poll.duration());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut summary = SessionSummary::default();
        let mut last_emotion: Option<Emotion> = None;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let reading = self.detector.analyze_emotion();
                    summary.record(reading);
                    if last_emotion != Some(reading.emotion) {
                        tracing::info!(
                            emotion = %reading.emotion,
                            confidence = reading.confidence,
                            "emotion changed"
                        );
                        last_emotion = Some(reading.emotion);
                    }
                    if let Err(e) = sink.publish(reading).await {
                        tracing::warn!(error = %e, "failed to deliver reading");
                    }
                }
                changed = stop.changed() => {
                    match changed {
                        // Spurious wake: the flag is still unset.
                        Ok(()) if !*stop.borrow() => continue,
                        // Stop requested, or the stop sender is gone.
                        _ => break,
                    }
                }
            }
        }

        self.detector.cleanup();
        tracing::info!(polls = summary.polls, "listening session ended");
        summary
    }
}
