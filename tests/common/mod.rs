// Shared helpers for integration tests
//
// `ScriptedBackend` stands in for a capture device: the test decides what
// probing and permission return, and pushes chunks by hand through `Script`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use voice_recorder::{
    AccessError, AudioChunk, DecodeSink, DeviceAvailability, Encoding, MemoryStorage, PcmFormat,
    Recorder, RecorderError, RecordingBackend, Registry,
};

#[derive(Default)]
pub struct Script {
    pub access_error: Mutex<Option<AccessError>>,
    pub start_error: Mutex<Option<RecorderError>>,
    pub stop_error: Mutex<Option<RecorderError>>,
    /// Replaces the availability the backend was built with
    pub availability: Mutex<Option<DeviceAvailability>>,
    sender: Mutex<Option<mpsc::Sender<AudioChunk>>>,
    timestamp_ms: AtomicUsize,
    pub access_requests: AtomicUsize,
    pub releases: AtomicUsize,
}

impl Script {
    /// Deliver one chunk, as a data-available callback would
    pub async fn emit(&self, data: &[u8]) {
        let tx = self
            .sender
            .lock()
            .unwrap()
            .clone()
            .expect("backend is not capturing");
        let ts = self.timestamp_ms.fetch_add(1000, Ordering::SeqCst) as u64;
        tx.send(AudioChunk::new(data.to_vec(), ts)).await.unwrap();
    }

    pub fn fail_access(&self, e: AccessError) {
        *self.access_error.lock().unwrap() = Some(e);
    }

    /// Make later probes report no device
    pub fn unplug(&self) {
        *self.availability.lock().unwrap() = Some(DeviceAvailability::Unavailable);
    }

    pub fn fail_next_start(&self, e: RecorderError) {
        *self.start_error.lock().unwrap() = Some(e);
    }

    pub fn fail_next_stop(&self, e: RecorderError) {
        *self.stop_error.lock().unwrap() = Some(e);
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

pub struct ScriptedBackend {
    script: Arc<Script>,
    availability: DeviceAvailability,
    encoding: Encoding,
    capturing: bool,
}

#[async_trait::async_trait]
impl RecordingBackend for ScriptedBackend {
    async fn probe(&self) -> DeviceAvailability {
        let current = *self.script.availability.lock().unwrap();
        current.unwrap_or(self.availability)
    }

    async fn request_access(&mut self) -> Result<(), AccessError> {
        self.script.access_requests.fetch_add(1, Ordering::SeqCst);
        match self.script.access_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, RecorderError> {
        if let Some(e) = self.script.start_error.lock().unwrap().take() {
            return Err(e);
        }

        let (tx, rx) = mpsc::channel(100);
        *self.script.sender.lock().unwrap() = Some(tx);
        self.script.timestamp_ms.store(0, Ordering::SeqCst);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        self.capturing = false;
        self.script.releases.fetch_add(1, Ordering::SeqCst);

        if let Some(e) = self.script.stop_error.lock().unwrap().take() {
            // A failing backend keeps its sender open
            return Err(e);
        }

        self.script.sender.lock().unwrap().take();
        Ok(())
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn format(&self) -> PcmFormat {
        PcmFormat {
            sample_rate: 8000,
            channels: 1,
        }
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn scripted_backend(
    availability: DeviceAvailability,
    encoding: Encoding,
) -> (Box<dyn RecordingBackend>, Arc<Script>) {
    let script = Arc::new(Script::default());
    let backend = ScriptedBackend {
        script: Arc::clone(&script),
        availability,
        encoding,
        capturing: false,
    };
    (Box::new(backend), script)
}

pub fn empty_registry() -> Arc<Registry> {
    Arc::new(Registry::new(Arc::new(MemoryStorage::with_document("[]"))))
}

/// Recorder over a pass-through (WebM) scripted backend and an empty registry
pub fn recorder_with(
    availability: DeviceAvailability,
) -> (Recorder, Arc<Script>, Arc<Registry>) {
    let (backend, script) = scripted_backend(availability, Encoding::Webm);
    let registry = empty_registry();
    let recorder = Recorder::new(backend, registry.clone(), Arc::new(DecodeSink));
    (recorder, script, registry)
}

/// Write a mono 16-bit WAV with a ramp of `frames` samples
pub fn write_wav(path: &std::path::Path, sample_rate: u32, frames: usize) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..frames {
        writer.write_sample((i % 1000) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
