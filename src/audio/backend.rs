use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::{AccessError, RecorderError};

/// One data-available delivery from a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Raw bytes (s16le PCM for WAV backends, container bytes otherwise)
    pub data: Vec<u8>,
    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioChunk {
    pub fn new(data: Vec<u8>, timestamp_ms: u64) -> Self {
        Self { data, timestamp_ms }
    }

    /// Pack interleaved i16 samples as little-endian bytes
    pub fn from_samples(samples: &[i16], timestamp_ms: u64) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self { data, timestamp_ms }
    }
}

/// Result of probing for input devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAvailability {
    Available,
    Unavailable,
    /// The platform exposes no capture API at all
    ApiUnsupported,
}

/// How a backend's chunks turn into a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Chunks are s16le PCM; a WAV header is written on finalize
    Wav,
    /// Chunks are pieces of an MP3 stream, concatenated as-is
    Mp3,
    /// Chunks are pieces of a WebM container, concatenated as-is
    Webm,
}

impl Encoding {
    pub fn extension(&self) -> &'static str {
        match self {
            Encoding::Wav => "wav",
            Encoding::Mp3 => "mp3",
            Encoding::Webm => "webm",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Encoding::Wav => "audio/wav",
            Encoding::Mp3 => "audio/mpeg",
            Encoding::Webm => "audio/webm",
        }
    }

    /// Guess from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Some(Encoding::Wav),
            "mp3" => Some(Encoding::Mp3),
            "webm" => Some(Encoding::Webm),
            _ => None,
        }
    }
}

/// PCM layout of a backend's chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    /// Bytes per second of s16le audio in this format
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * 2
    }
}

/// Configuration for recording backends
#[derive(Debug, Clone)]
pub struct RecordingBackendConfig {
    /// Requested sample rate (the device may override it)
    pub sample_rate: u32,
    /// Requested channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// How much audio each chunk carries, in milliseconds
    pub buffer_duration_ms: u64,
    /// Pace file playback at wall-clock speed
    pub realtime: bool,
}

impl Default for RecordingBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            buffer_duration_ms: 1000, // one chunk per second, like a timesliced MediaRecorder
            realtime: true,
        }
    }
}

/// Capture backend behind the recorder
///
/// Implementations:
/// - `FileBackend`: replays an audio file as if it were captured live
/// - `MicrophoneBackend`: default input device via cpal (feature `microphone`)
#[async_trait::async_trait]
pub trait RecordingBackend: Send + Sync {
    /// Look for usable input devices
    async fn probe(&self) -> DeviceAvailability;

    /// Open the device once to confirm access, then release it again
    async fn request_access(&mut self) -> Result<(), AccessError>;

    /// Start capturing
    ///
    /// Returns a channel receiver that yields chunks until the backend stops.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, RecorderError>;

    /// Stop capturing and release the device
    ///
    /// The chunk sender must be dropped by the time this returns `Ok`.
    async fn stop(&mut self) -> Result<(), RecorderError>;

    /// How chunks from this backend are finalized
    fn encoding(&self) -> Encoding;

    /// PCM layout of the current (or last) capture
    fn format(&self) -> PcmFormat;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Backend kind selected in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    Microphone,
}

/// Where a backend reads from
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Default input device
    Microphone,
    /// Replay an audio file
    File(PathBuf),
}

/// Recording backend factory
pub struct RecordingBackendFactory;

impl RecordingBackendFactory {
    /// Create a backend for the given source
    pub fn create(
        source: AudioSource,
        config: RecordingBackendConfig,
    ) -> Result<Box<dyn RecordingBackend>> {
        match source {
            AudioSource::File(path) => {
                let backend = super::file::FileBackend::new(path, config)?;
                Ok(Box::new(backend))
            }

            AudioSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    let backend = super::microphone::MicrophoneBackend::new(config);
                    Ok(Box::new(backend))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    let _ = config;
                    anyhow::bail!("Microphone capture requires building with the `microphone` feature")
                }
            }
        }
    }
}
