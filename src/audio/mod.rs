pub mod artifact;
pub mod backend;
pub mod file;
pub mod playback;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use artifact::Artifact;
pub use backend::{
    AudioChunk, AudioSource, BackendKind, DeviceAvailability, Encoding, PcmFormat,
    RecordingBackend, RecordingBackendConfig, RecordingBackendFactory,
};
pub use file::{AudioFile, FileBackend};
pub use playback::{AudioSink, CommandSink, DecodeSink, PlaybackReport};
