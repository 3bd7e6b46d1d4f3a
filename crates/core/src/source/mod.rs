#[cfg(feature = "mic")]
pub mod mic;
pub mod synth;
pub mod wav;

/// A mono audio feed polled by the detector.
///
/// Implementations hand over whatever samples accumulated since the
/// previous call. The detector polls on a fixed cadence and does not
/// care whether chunks are exactly poll-sized.
pub trait AudioSource: Send {
    fn sample_rate(&self) -> u32;

    /// `None` means the source has nothing to give right now. For
    /// finite sources (WAV replay) it also means the audio has ended.
    fn read_chunk(&mut self) -> Option<Vec<f32>>;
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("wav `{path}`: {source}")]
    Wav {
        path: String,
        #[source]
        source: hound::Error,
    },
    #[cfg(feature = "mic")]
    #[error("no default input device (name one with --device)")]
    NoDefaultInputDevice,
    #[cfg(feature = "mic")]
    #[error("no input device matching `{wanted}`; available: {available:?}")]
    UnknownInputDevice {
        wanted: String,
        available: Vec<String>,
    },
    #[cfg(feature = "mic")]
    #[error("list input devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[cfg(feature = "mic")]
    #[error("query stream config: {0}")]
    StreamConfig(#[from] cpal::DefaultStreamConfigError),
    #[cfg(feature = "mic")]
    #[error("build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[cfg(feature = "mic")]
    #[error("start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[cfg(feature = "mic")]
    #[error("unsupported sample format {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),
    #[cfg(feature = "mic")]
    #[error("capture thread did not report back in time")]
    CaptureThreadStalled,
}

/// Averages interleaved frames down to mono.
pub(crate) fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
