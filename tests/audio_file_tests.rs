// Integration tests for audio file processing
//
// These tests verify that we can read WAV files and extract audio data correctly.

mod common;

use anyhow::Result;
use std::path::PathBuf;
use voice_recorder::{AudioFile, PcmFormat};

fn get_test_fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(filename)
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let path = get_test_fixture_path("sample.wav");

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 32000);
    assert!((audio.duration_seconds - 2.0).abs() < f64::EPSILON);
    assert!(audio.path.contains("sample.wav"));

    Ok(())
}

#[test]
fn test_audio_file_format() -> Result<()> {
    let audio = AudioFile::open(get_test_fixture_path("sample.wav"))?;

    assert_eq!(
        audio.format(),
        PcmFormat {
            sample_rate: 16000,
            channels: 1
        }
    );
    assert_eq!(audio.format().byte_rate(), 32000);

    Ok(())
}

#[test]
fn test_audio_file_generated_samples_match() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ramp.wav");
    common::write_wav(&path, 8000, 2500)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.samples.len(), 2500);
    assert_eq!(audio.samples[0], 0);
    assert_eq!(audio.samples[999], 999);
    assert_eq!(audio.samples[1000], 0);

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_rejects_non_wav() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fake.wav");
    std::fs::write(&path, b"definitely not RIFF")?;

    assert!(AudioFile::open(&path).is_err());

    Ok(())
}
