use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audio::{Artifact, AudioChunk};

/// Where the recorder is in its capture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderStatus {
    /// Devices not checked yet
    #[default]
    Idle,
    /// No usable input; stays here for the life of this recorder
    DeviceUnavailable,
    /// Devices present, permission not granted yet
    ReadyForPermission,
    PermissionGranted,
    Recording,
    Stopped,
}

/// What a call to `start()` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Permission was missing, so it was requested instead of starting
    PermissionRequested,
    /// Already recording; nothing changed
    AlreadyRecording,
}

/// State of the current (or last) recording
#[derive(Debug, Default)]
pub struct RecordingSession {
    /// Seconds recorded, advanced by the timer task
    pub(crate) elapsed: Arc<AtomicU64>,
    /// Chunks delivered so far, bumped by the collector task
    pub(crate) received: Arc<AtomicUsize>,
    /// Finalized chunks, filled in on stop
    pub(crate) chunks: Vec<AudioChunk>,
    pub(crate) artifact: Option<Artifact>,
    pub(crate) started_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    /// Forget everything from the previous recording
    pub(crate) fn reset(&mut self) {
        self.elapsed.store(0, Ordering::SeqCst);
        self.received.store(0, Ordering::SeqCst);
        self.chunks.clear();
        self.artifact = None;
        self.started_at = Some(Utc::now());
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    pub fn chunk_count(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }

    pub fn chunks(&self) -> &[AudioChunk] {
        &self.chunks
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

/// `m:ss`, the recorder's timer display
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
