//! The recorder
//!
//! `Recorder` owns the capture lifecycle (device check, permission, start,
//! stop) over any `RecordingBackend`, and exposes play, download and save on
//! the finished artifact.

mod recorder;
mod state;

pub use recorder::Recorder;
pub use state::{format_elapsed, RecorderStatus, RecordingSession, StartOutcome};
