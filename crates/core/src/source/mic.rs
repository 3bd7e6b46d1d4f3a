use super::{downmix, AudioSource, SourceError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const STOP_POLL: Duration = Duration::from_millis(50);

/// Live microphone capture.
///
/// cpal streams are not `Send`, so the stream lives and dies on a
/// dedicated thread; samples come back mono over a channel and
/// [`read_chunk`](AudioSource::read_chunk) drains whatever has
/// accumulated since the last poll.
pub struct MicSource {
    sample_rate_hz: u32,
    chunks: mpsc::Receiver<Vec<f32>>,
    stop: Arc<AtomicBool>,
}

impl MicSource {
    /// Opens the default input device, or the named one
    /// (case-insensitive) when `device_name` is given.
    pub fn open(device_name: Option<&str>) -> Result<Self, SourceError> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(wanted) => find_input_device(&host, wanted)?,
            None => host
                .default_input_device()
                .ok_or(SourceError::NoDefaultInputDevice)?,
        };
        let supported = device.default_input_config()?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = usize::from(supported.config().channels);
        let sample_format = supported.sample_format();
        let config = supported.config();

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "<unnamed>".to_owned()),
            sample_rate_hz,
            channels,
            format = ?sample_format,
            "opening microphone capture"
        );

        let (chunk_tx, chunk_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        thread::spawn(move || {
            let stream =
                match build_capture_stream(&device, &config, sample_format, channels, chunk_tx) {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(SourceError::PlayStream(e)));
                return;
            }
            if ready_tx.send(Ok(())).is_err() {
                return;
            }
            while !thread_stop.load(Ordering::Relaxed) {
                thread::sleep(STOP_POLL);
            }
            drop(stream);
        });

        match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(())) => Ok(Self {
                sample_rate_hz,
                chunks: chunk_rx,
                stop,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SourceError::CaptureThreadStalled),
        }
    }
}

impl AudioSource for MicSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }

    fn read_chunk(&mut self) -> Option<Vec<f32>> {
        let mut merged = Vec::new();
        while let Ok(chunk) = self.chunks.try_recv() {
            merged.extend_from_slice(&chunk);
        }
        if merged.is_empty() {
            None
        } else {
            Some(merged)
        }
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn build_capture_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    channels: usize,
    chunks: mpsc::Sender<Vec<f32>>,
) -> Result<cpal::Stream, SourceError> {
    let err_fn = |e: cpal::StreamError| tracing::warn!(error = %e, "input stream error");
    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = chunks.send(downmix(data, channels));
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let scaled: Vec<f32> = data.iter().map(|&v| f32::from(v) / 32_768.0).collect();
                let _ = chunks.send(downmix(&scaled, channels));
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                let scaled: Vec<f32> = data
                    .iter()
                    .map(|&v| (f32::from(v) - 32_768.0) / 32_768.0)
                    .collect();
                let _ = chunks.send(downmix(&scaled, channels));
            },
            err_fn,
            None,
        )?,
        other => return Err(SourceError::UnsupportedSampleFormat(other)),
    };
    Ok(stream)
}

fn normalize_device_name(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

fn find_input_device(host: &cpal::Host, wanted: &str) -> Result<cpal::Device, SourceError> {
    let wanted_norm = normalize_device_name(wanted);
    let mut available = Vec::new();
    let mut selected = None;
    for device in host.input_devices()? {
        let name = device.name().unwrap_or_else(|_| "<unnamed>".to_owned());
        if normalize_device_name(&name) == wanted_norm {
            selected = Some(device);
        }
        available.push(name);
    }
    selected.ok_or(SourceError::UnknownInputDevice {
        wanted: wanted.to_owned(),
        available,
    })
}
