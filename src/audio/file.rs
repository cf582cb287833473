// File-fed recording backend
//
// Replays an audio file through the same chunk channel a live device would
// use. WAV files are decoded to PCM and re-encoded on finalize; MP3/WebM
// files are sliced into byte chunks and passed through untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use hound::WavReader;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{
    AudioChunk, DeviceAvailability, Encoding, PcmFormat, RecordingBackend, RecordingBackendConfig,
};
use crate::error::{AccessError, RecorderError};

/// Size of pass-through chunks for container formats
const PASSTHROUGH_CHUNK_BYTES: usize = 16 * 1024;

/// Decoded WAV file
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        debug!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    pub fn format(&self) -> PcmFormat {
        PcmFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Backend that "captures" the contents of a file
pub struct FileBackend {
    path: PathBuf,
    encoding: Encoding,
    config: RecordingBackendConfig,
    format: PcmFormat,
    feeder: Option<Feeder>,
}

struct Feeder {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>, config: RecordingBackendConfig) -> Result<Self> {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let encoding = Encoding::from_extension(ext)
            .with_context(|| format!("Unsupported audio file type: {:?}", path))?;

        let format = PcmFormat {
            sample_rate: config.sample_rate,
            channels: config.channels,
        };

        Ok(Self {
            path,
            encoding,
            config,
            format,
            feeder: None,
        })
    }

    /// Split the file into chunks up front
    fn load_chunks(&mut self) -> Result<Vec<AudioChunk>, RecorderError> {
        match self.encoding {
            Encoding::Wav => {
                let audio = AudioFile::open(&self.path)
                    .map_err(|e| RecorderError::BackendStart(format!("{:#}", e)))?;
                self.format = audio.format();

                let frames_per_chunk = (audio.sample_rate as u64 * self.config.buffer_duration_ms
                    / 1000)
                    .max(1) as usize;
                let samples_per_chunk = frames_per_chunk * audio.channels as usize;

                Ok(audio
                    .samples
                    .chunks(samples_per_chunk)
                    .enumerate()
                    .map(|(i, samples)| {
                        AudioChunk::from_samples(samples, i as u64 * self.config.buffer_duration_ms)
                    })
                    .collect())
            }
            Encoding::Mp3 | Encoding::Webm => {
                let bytes = std::fs::read(&self.path).map_err(|e| {
                    RecorderError::BackendStart(format!("Failed to read {:?}: {}", self.path, e))
                })?;

                Ok(bytes
                    .chunks(PASSTHROUGH_CHUNK_BYTES)
                    .enumerate()
                    .map(|(i, data)| {
                        AudioChunk::new(data.to_vec(), i as u64 * self.config.buffer_duration_ms)
                    })
                    .collect())
            }
        }
    }
}

#[async_trait::async_trait]
impl RecordingBackend for FileBackend {
    async fn probe(&self) -> DeviceAvailability {
        if tokio::fs::metadata(&self.path).await.is_ok() {
            DeviceAvailability::Available
        } else {
            DeviceAvailability::Unavailable
        }
    }

    async fn request_access(&mut self) -> Result<(), AccessError> {
        // Open and immediately close: nothing stays held until start()
        match tokio::fs::File::open(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) => Err(match e.kind() {
                std::io::ErrorKind::NotFound => AccessError::NotFound,
                std::io::ErrorKind::PermissionDenied => AccessError::Denied,
                _ => AccessError::Other(e.to_string()),
            }),
        }
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, RecorderError> {
        if self.feeder.is_some() {
            return Err(RecorderError::BackendStart("Already capturing".to_string()));
        }

        let chunks = self.load_chunks()?;
        info!(
            "Replaying {:?} as {} chunks ({})",
            self.path,
            chunks.len(),
            self.encoding.extension()
        );

        let (tx, rx) = mpsc::channel(100);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let pace = self
            .config
            .realtime
            .then(|| Duration::from_millis(self.config.buffer_duration_ms));

        let handle = tokio::spawn(async move {
            for chunk in chunks {
                if let Some(pace) = pace {
                    tokio::select! {
                        _ = tokio::time::sleep(pace) => {}
                        _ = &mut stop_rx => break,
                    }
                } else if stop_rx.try_recv().is_ok() {
                    break;
                }

                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            debug!("File feeder finished");
        });

        self.feeder = Some(Feeder { stop_tx, handle });
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        let Some(feeder) = self.feeder.take() else {
            return Ok(());
        };

        // Feeder may already be done; a closed stop channel is fine
        let _ = feeder.stop_tx.send(());
        if let Err(e) = feeder.handle.await {
            warn!("File feeder task failed: {}", e);
            return Err(RecorderError::BackendStop(e.to_string()));
        }

        info!("File backend stopped: {:?}", self.path);
        Ok(())
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn format(&self) -> PcmFormat {
        self.format
    }

    fn is_capturing(&self) -> bool {
        self.feeder.is_some()
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_extension() {
        let result = FileBackend::new("notes.txt", RecordingBackendConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_encoding_follows_extension() -> Result<()> {
        let backend = FileBackend::new("take.webm", RecordingBackendConfig::default())?;
        assert_eq!(backend.encoding(), Encoding::Webm);
        assert!(!backend.is_capturing());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() -> Result<()> {
        let mut backend =
            FileBackend::new("/nonexistent/take.wav", RecordingBackendConfig::default())?;

        assert_eq!(backend.probe().await, DeviceAvailability::Unavailable);
        assert_eq!(backend.request_access().await, Err(AccessError::NotFound));
        Ok(())
    }
}
