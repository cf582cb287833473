pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod listing;
pub mod recorder;
pub mod registry;

pub use audio::{
    AudioChunk, AudioFile, AudioSink, AudioSource, Artifact, BackendKind, CommandSink,
    DecodeSink, DeviceAvailability, Encoding, FileBackend, PcmFormat, PlaybackReport,
    RecordingBackend, RecordingBackendConfig, RecordingBackendFactory,
};
pub use config::Config;
pub use error::{AccessError, RecorderError, RegistryError};
pub use http::{create_router, AppState};
pub use listing::ListingView;
pub use recorder::{Recorder, RecorderStatus, RecordingSession, StartOutcome};
pub use registry::{
    DocumentStorage, FileStorage, KeyValueStorage, MemoryStorage, RecordingEntry,
    RecordingRegistry, Registry, RegistryClient,
};
