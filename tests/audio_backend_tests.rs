// Integration tests for recording backends
//
// These tests exercise the backend abstraction through the file backend,
// which replays a file through the same chunk channel a device would use.

mod common;

use anyhow::Result;
use std::path::PathBuf;
use voice_recorder::{
    AccessError, Artifact, AudioSource, DeviceAvailability, Encoding, FileBackend, PcmFormat,
    RecordingBackend, RecordingBackendConfig, RecordingBackendFactory,
};

fn fast_config() -> RecordingBackendConfig {
    RecordingBackendConfig {
        buffer_duration_ms: 250,
        realtime: false,
        ..Default::default()
    }
}

async fn drain(backend: &mut dyn RecordingBackend) -> Result<Vec<voice_recorder::AudioChunk>> {
    let mut rx = backend.start().await?;
    let mut chunks = Vec::new();
    while let Some(chunk) = rx.recv().await {
        chunks.push(chunk);
    }
    backend.stop().await?;
    Ok(chunks)
}

#[tokio::test]
async fn test_backend_factory_creates_file_backend() -> Result<()> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.wav");

    let backend = RecordingBackendFactory::create(AudioSource::File(path), fast_config())?;

    assert_eq!(backend.name(), "file");
    assert_eq!(backend.encoding(), Encoding::Wav);
    assert!(!backend.is_capturing());
    assert_eq!(backend.probe().await, DeviceAvailability::Available);

    Ok(())
}

#[cfg(not(feature = "microphone"))]
#[test]
fn test_microphone_requires_feature() {
    let result = RecordingBackendFactory::create(AudioSource::Microphone, fast_config());
    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_file_reports_not_found() -> Result<()> {
    let mut backend = FileBackend::new("/nonexistent/take.wav", fast_config())?;

    assert_eq!(backend.probe().await, DeviceAvailability::Unavailable);
    assert_eq!(backend.request_access().await, Err(AccessError::NotFound));

    Ok(())
}

#[tokio::test]
async fn test_wav_is_split_into_timed_chunks() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("take.wav");
    // One second at 8kHz: four 250ms chunks of 2000 frames
    common::write_wav(&path, 8000, 8000)?;

    let mut backend = FileBackend::new(&path, fast_config())?;
    backend.request_access().await?;
    let chunks = drain(&mut backend).await?;

    assert_eq!(chunks.len(), 4);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.data.len(), 4000);
        assert_eq!(chunk.timestamp_ms, i as u64 * 250);
    }
    assert_eq!(
        backend.format(),
        PcmFormat {
            sample_rate: 8000,
            channels: 1
        }
    );
    assert!(!backend.is_capturing());

    let artifact = Artifact::assemble(backend.encoding(), backend.format(), &chunks)?;
    assert_eq!(artifact.duration_secs, 1.0);
    assert_eq!(&artifact.bytes[0..4], b"RIFF");

    Ok(())
}

#[tokio::test]
async fn test_container_bytes_pass_through_unchanged() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("take.webm");
    let original: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &original)?;

    let mut backend = FileBackend::new(&path, fast_config())?;
    let chunks = drain(&mut backend).await?;

    // 16 KiB slices
    assert_eq!(chunks.len(), 3);
    let artifact = Artifact::assemble(Encoding::Webm, backend.format(), &chunks)?;
    assert_eq!(artifact.bytes, original);
    assert_eq!(artifact.encoding.mime_type(), "audio/webm");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_interrupts_realtime_replay() -> Result<()> {
    let config = RecordingBackendConfig {
        buffer_duration_ms: 1000,
        realtime: true,
        ..Default::default()
    };
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.wav");
    let mut backend = FileBackend::new(path, config)?;

    let mut rx = backend.start().await?;
    assert!(backend.is_capturing());

    // First chunk arrives after one paced interval
    let first = rx.recv().await.expect("first chunk");
    assert_eq!(first.timestamp_ms, 0);

    backend.stop().await?;
    assert!(!backend.is_capturing());

    // Sender is gone once stop returns
    let mut rest = 0;
    while rx.recv().await.is_some() {
        rest += 1;
    }
    assert!(rest <= 1);

    Ok(())
}

#[tokio::test]
async fn test_start_twice_is_rejected() -> Result<()> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.wav");
    let mut backend = FileBackend::new(path, fast_config())?;

    let _rx = backend.start().await?;
    assert!(backend.start().await.is_err());
    backend.stop().await?;

    Ok(())
}
