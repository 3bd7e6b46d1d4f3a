use super::{downmix, AudioSource, SourceError};
use crate::config::PollInterval;
use std::{fs::File, io::BufReader, path::Path};

/// Replays a WAV file in poll-sized chunks, downmixed to mono.
/// Integer samples are scaled to `[-1, 1]`; 32-bit float files pass
/// through untouched.
pub struct WavSource {
    reader: hound::WavReader<BufReader<File>>,
    sample_format: hound::SampleFormat,
    scale: f32,
    channels: usize,
    sample_rate_hz: u32,
    chunk_len: usize,
    path: String,
}

impl WavSource {
    pub fn open(path: impl AsRef<Path>, poll: PollInterval) -> Result<Self, SourceError> {
        let path_str = path.as_ref().display().to_string();
        let reader = hound::WavReader::open(path.as_ref()).map_err(|source| SourceError::Wav {
            path: path_str.clone(),
            source,
        })?;
        let spec = reader.spec();
        let scale = match spec.sample_format {
            hound::SampleFormat::Float => 1.0,
            hound::SampleFormat::Int => 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32,
        };
        Ok(Self {
            sample_format: spec.sample_format,
            scale,
            channels: spec.channels as usize,
            sample_rate_hz: spec.sample_rate,
            chunk_len: poll.samples_for_rate(spec.sample_rate),
            path: path_str,
            reader,
        })
    }
}

impl AudioSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }

    fn read_chunk(&mut self) -> Option<Vec<f32>> {
        let wanted = self.chunk_len * self.channels;
        let mut interleaved = Vec::with_capacity(wanted);
        match self.sample_format {
            hound::SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(wanted) {
                    match sample {
                        Ok(v) => interleaved.push(v),
                        Err(e) => {
                            tracing::warn!(path = %self.path, error = %e, "wav read failed, ending replay");
                            break;
                        }
                    }
                }
            }
            hound::SampleFormat::Int => {
                for sample in self.reader.samples::<i32>().take(wanted) {
                    match sample {
                        Ok(v) => interleaved.push(v as f32 * self.scale),
                        Err(e) => {
                            tracing::warn!(path = %self.path, error = %e, "wav read failed, ending replay");
                            break;
                        }
                    }
                }
            }
        }
        if interleaved.is_empty() {
            return None;
        }
        Some(downmix(&interleaved, self.channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_wav(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .subsec_nanos();
        std::env::temp_dir().join(format!(
            "voice-emotion-{tag}-{}-{nanos}.wav",
            std::process::id()
        ))
    }

    fn poll_1ms() -> PollInterval {
        PollInterval::new(1).expect("nonzero")
    }

    #[test]
    fn mono_i16_is_scaled_and_chunked() {
        let path = temp_wav("mono");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for _ in 0..8 {
            writer.write_sample(16_384i16).expect("write");
        }
        for _ in 0..8 {
            writer.write_sample(-16_384i16).expect("write");
        }
        for _ in 0..4 {
            writer.write_sample(8_192i16).expect("write");
        }
        writer.finalize().expect("finalize");

        // 1 ms at 8 kHz puts 8 mono samples in each chunk.
        let mut source = WavSource::open(&path, poll_1ms()).expect("open wav");
        assert_eq!(source.sample_rate(), 8_000);

        let first = source.read_chunk().expect("first chunk");
        assert_eq!(first.len(), 8);
        assert!(first.iter().all(|v| (v - 0.5).abs() < 1e-4));

        let second = source.read_chunk().expect("second chunk");
        assert!(second.iter().all(|v| (v + 0.5).abs() < 1e-4));

        let tail = source.read_chunk().expect("partial tail");
        assert_eq!(tail.len(), 4);
        assert!(tail.iter().all(|v| (v - 0.25).abs() < 1e-4));

        assert_eq!(source.read_chunk(), None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn stereo_downmixes_to_channel_average() {
        let path = temp_wav("stereo");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for _ in 0..4 {
            writer.write_sample(8_192i16).expect("write left");
            writer.write_sample(24_576i16).expect("write right");
        }
        writer.finalize().expect("finalize");

        let mut source = WavSource::open(&path, poll_1ms()).expect("open wav");
        let chunk = source.read_chunk().expect("chunk");
        assert_eq!(chunk.len(), 4);
        assert!(chunk.iter().all(|v| (v - 0.5).abs() < 1e-4));
        assert_eq!(source.read_chunk(), None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn float_wav_passes_through() {
        let path = temp_wav("float");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for _ in 0..8 {
            writer.write_sample(0.25f32).expect("write");
        }
        writer.finalize().expect("finalize");

        let mut source = WavSource::open(&path, poll_1ms()).expect("open wav");
        let chunk = source.read_chunk().expect("chunk");
        assert_eq!(chunk, vec![0.25; 8]);
        assert_eq!(source.read_chunk(), None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_reports_path() {
        // WavSource holds a non-Debug reader, so destructure instead of
        // unwrap_err.
        let Err(err) = WavSource::open("/no/such/file.wav", poll_1ms()) else {
            panic!("open must fail");
        };
        assert!(err.to_string().contains("/no/such/file.wav"));
    }
}
