use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::state::{format_elapsed, RecorderStatus, RecordingSession, StartOutcome};
use crate::audio::{
    Artifact, AudioChunk, AudioSink, DeviceAvailability, PlaybackReport, RecordingBackend,
};
use crate::error::RecorderError;
use crate::registry::{RecordingEntry, RecordingRegistry};

/// Background tasks alive while recording
struct CaptureTasks {
    ticker: JoinHandle<()>,
    collector: JoinHandle<Vec<AudioChunk>>,
    finish_tx: oneshot::Sender<()>,
}

/// The recorder: capture lifecycle plus play/download/save actions
///
/// Every failure is stored as the current error message (see
/// `error_message`) and also returned to the caller.
pub struct Recorder {
    backend: Box<dyn RecordingBackend>,
    registry: Arc<dyn RecordingRegistry>,
    sink: Arc<dyn AudioSink>,
    status: RecorderStatus,
    availability: Option<DeviceAvailability>,
    permission_granted: bool,
    session: RecordingSession,
    error: Option<RecorderError>,
    pending_name: String,
    capture: Option<CaptureTasks>,
}

impl Recorder {
    pub fn new(
        backend: Box<dyn RecordingBackend>,
        registry: Arc<dyn RecordingRegistry>,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            backend,
            registry,
            sink,
            status: RecorderStatus::Idle,
            availability: None,
            permission_granted: false,
            session: RecordingSession::default(),
            error: None,
            pending_name: String::new(),
            capture: None,
        }
    }

    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.session.artifact()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session.elapsed_seconds()
    }

    pub fn formatted_elapsed(&self) -> String {
        format_elapsed(self.elapsed_seconds())
    }

    /// Chunks delivered since the last start
    pub fn chunk_count(&self) -> usize {
        self.session.chunk_count()
    }

    pub fn error(&self) -> Option<&RecorderError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn pending_name(&self) -> &str {
        &self.pending_name
    }

    pub fn set_pending_name(&mut self, name: impl Into<String>) {
        self.pending_name = name.into();
    }

    fn fail(&mut self, e: RecorderError) -> RecorderError {
        warn!("{}", e);
        self.error = Some(e.clone());
        e
    }

    /// Probe the backend for input devices
    pub async fn check_device_availability(&mut self) -> DeviceAvailability {
        if self.status == RecorderStatus::DeviceUnavailable {
            return self.availability.unwrap_or(DeviceAvailability::Unavailable);
        }

        let availability = self.backend.probe().await;
        self.availability = Some(availability);
        debug!("{} backend reports {:?}", self.backend.name(), availability);

        // An active recording keeps its status so stop() can still finalize it
        let recording = self.status == RecorderStatus::Recording;
        match availability {
            DeviceAvailability::Available => {
                if self.status == RecorderStatus::Idle {
                    self.status = RecorderStatus::ReadyForPermission;
                }
            }
            DeviceAvailability::Unavailable => {
                if !recording {
                    self.status = RecorderStatus::DeviceUnavailable;
                }
                self.fail(RecorderError::DeviceUnavailable);
            }
            DeviceAvailability::ApiUnsupported => {
                if !recording {
                    self.status = RecorderStatus::DeviceUnavailable;
                }
                self.fail(RecorderError::ApiUnsupported);
            }
        }

        availability
    }

    /// Ask for microphone access; the device is released again right away
    pub async fn request_permission(&mut self) -> Result<(), RecorderError> {
        match self.backend.request_access().await {
            Ok(()) => {
                info!("Microphone permission granted");
                self.permission_granted = true;
                self.error = None;
                if matches!(
                    self.status,
                    RecorderStatus::Idle | RecorderStatus::ReadyForPermission
                ) {
                    self.status = RecorderStatus::PermissionGranted;
                }
                Ok(())
            }
            Err(e) => {
                self.permission_granted = false;
                if !matches!(
                    self.status,
                    RecorderStatus::DeviceUnavailable | RecorderStatus::Recording
                ) {
                    self.status = RecorderStatus::ReadyForPermission;
                }
                Err(self.fail(e.into()))
            }
        }
    }

    /// Begin a new recording
    pub async fn start(&mut self) -> Result<StartOutcome, RecorderError> {
        if self.status == RecorderStatus::Recording {
            warn!("Recording already started");
            return Ok(StartOutcome::AlreadyRecording);
        }

        if self.availability.is_none() {
            self.check_device_availability().await;
        }
        match self.availability {
            Some(DeviceAvailability::Unavailable) => {
                return Err(self.fail(RecorderError::DeviceUnavailable))
            }
            Some(DeviceAvailability::ApiUnsupported) => {
                return Err(self.fail(RecorderError::ApiUnsupported))
            }
            _ => {}
        }

        if !self.permission_granted {
            self.request_permission().await?;
            return Ok(StartOutcome::PermissionRequested);
        }

        // A failed start keeps the previous artifact
        let rx = match self.backend.start().await {
            Ok(rx) => rx,
            Err(e) => return Err(self.fail(e)),
        };

        // Nothing from the previous recording may leak into this one
        self.session.reset();
        self.error = None;

        let (finish_tx, finish_rx) = oneshot::channel();
        let collector = tokio::spawn(collect_chunks(
            rx,
            finish_rx,
            Arc::clone(&self.session.received),
        ));
        let ticker = tokio::spawn(tick(Arc::clone(&self.session.elapsed)));

        self.capture = Some(CaptureTasks {
            ticker,
            collector,
            finish_tx,
        });
        self.status = RecorderStatus::Recording;
        info!("Recording started ({} backend)", self.backend.name());

        Ok(StartOutcome::Started)
    }

    /// Finish the current recording and build the artifact
    ///
    /// Does nothing when not recording. Device release and artifact assembly
    /// are both attempted even if the other fails; the first error is returned.
    pub async fn stop(&mut self) -> Result<(), RecorderError> {
        if self.status != RecorderStatus::Recording {
            debug!("Stop requested while {:?}; ignoring", self.status);
            return Ok(());
        }
        let Some(capture) = self.capture.take() else {
            self.status = RecorderStatus::Stopped;
            return Ok(());
        };

        // Timer goes first so elapsed cannot move after this point
        capture.ticker.abort();
        let _ = capture.ticker.await;
        self.status = RecorderStatus::Stopped;

        let mut first_error = None;

        if let Err(e) = self.backend.stop().await {
            error!("Failed to stop {} backend: {}", self.backend.name(), e);
            first_error = Some(e);
        }

        // The backend may not have dropped its sender if stop failed
        let _ = capture.finish_tx.send(());
        let chunks = match capture.collector.await {
            Ok(chunks) => chunks,
            Err(e) => {
                error!("Chunk collector failed: {}", e);
                first_error.get_or_insert(RecorderError::BackendStop(e.to_string()));
                Vec::new()
            }
        };

        match Artifact::assemble(self.backend.encoding(), self.backend.format(), &chunks) {
            Ok(artifact) => {
                info!(
                    "Recording stopped: {} chunks, {} ({} bytes)",
                    chunks.len(),
                    self.formatted_elapsed(),
                    artifact.bytes.len()
                );
                self.session.artifact = Some(artifact);
                self.session.chunks = chunks;
            }
            Err(e) => {
                error!("Failed to assemble recording: {:#}", e);
                first_error.get_or_insert(RecorderError::BackendStop(e.to_string()));
            }
        }

        match first_error {
            Some(e) => Err(self.fail(e)),
            None => Ok(()),
        }
    }

    /// Play the current artifact, if any
    pub async fn play(&mut self) -> Result<Option<PlaybackReport>, RecorderError> {
        let Some(artifact) = self.session.artifact.as_ref() else {
            return Ok(None);
        };

        match self.sink.play(artifact).await {
            Ok(report) => Ok(Some(report)),
            Err(e) => Err(self.fail(RecorderError::Playback(format!("{:#}", e)))),
        }
    }

    /// Save the artifact into `dir`; an empty name gets a timestamped default
    pub fn download(
        &mut self,
        suggested_name: &str,
        dir: impl AsRef<Path>,
    ) -> Result<Option<PathBuf>, RecorderError> {
        let Some(artifact) = self.session.artifact.as_ref() else {
            return Ok(None);
        };

        match artifact.download(suggested_name, dir) {
            Ok(path) => Ok(Some(path)),
            Err(e) => Err(self.fail(RecorderError::Download(format!("{:#}", e)))),
        }
    }

    /// Persist `name` to the registry
    pub async fn save(&mut self, name: &str) -> Result<RecordingEntry, RecorderError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.fail(RecorderError::Validation(
                "Please enter a name for the recording.".to_string(),
            )));
        }

        let duration = self
            .session
            .artifact
            .as_ref()
            .map(|a| a.duration_secs.round() as u64)
            .unwrap_or_else(|| self.elapsed_seconds());
        let entry = RecordingEntry::with_metadata(name, duration);

        match self.registry.save(entry.clone()).await {
            Ok(()) => {
                info!("Saved recording \"{}\"", entry.name);
                self.pending_name.clear();
                Ok(entry)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Save under the pending name
    pub async fn save_pending(&mut self) -> Result<RecordingEntry, RecorderError> {
        let name = self.pending_name.clone();
        self.save(&name).await
    }

    /// Tear down: stop an active recording and release the device
    pub async fn shutdown(&mut self) {
        if self.status == RecorderStatus::Recording {
            if let Err(e) = self.stop().await {
                warn!("Recording did not stop cleanly on shutdown: {}", e);
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.ticker.abort();
            capture.collector.abort();
        }
    }
}

/// One-second timer advancing `elapsed` until aborted
async fn tick(elapsed: Arc<std::sync::atomic::AtomicU64>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        elapsed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Gather chunks until the channel closes or `finish_rx` fires
async fn collect_chunks(
    mut rx: mpsc::Receiver<AudioChunk>,
    mut finish_rx: oneshot::Receiver<()>,
    received: Arc<std::sync::atomic::AtomicUsize>,
) -> Vec<AudioChunk> {
    let mut chunks = Vec::new();
    let push = |chunk: AudioChunk, chunks: &mut Vec<AudioChunk>| {
        if !chunk.data.is_empty() {
            received.fetch_add(1, Ordering::SeqCst);
            chunks.push(chunk);
        }
    };

    loop {
        tokio::select! {
            biased;
            chunk = rx.recv() => match chunk {
                Some(chunk) => push(chunk, &mut chunks),
                None => break,
            },
            _ = &mut finish_rx => {
                // Take whatever was queued before the stop
                while let Ok(chunk) = rx.try_recv() {
                    push(chunk, &mut chunks);
                }
                break;
            }
        }
    }

    chunks
}
