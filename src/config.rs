use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::audio::{AudioSource, BackendKind, RecordingBackendConfig};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/voice-recorder";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub registry: RegistryConfig,
    pub recorder: RecorderConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    /// One JSON array file
    File,
    /// A key inside a local key-value JSON file
    KeyValue,
}

/// Where the recorder saves names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    /// Write the registry document directly
    Local,
    /// POST to a running registry service
    Remote,
}

#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    pub storage: StorageKind,
    pub path: String,
    pub key: String,
    pub mode: RegistryMode,
    /// Base URL of the registry service when `mode = "remote"`
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct RecorderConfig {
    pub backend: BackendKind,
    /// Audio file replayed by the file backend
    pub source: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,
    pub realtime: bool,
    pub downloads_path: String,
    /// External player command; decode-only playback when absent
    pub player: Option<String>,
}

impl Config {
    /// Defaults, then `path` (any format the `config` crate knows, optional),
    /// then `VOICE_RECORDER__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "voice-recorder")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3000)?
            .set_default("registry.storage", "file")?
            .set_default("registry.path", "public/recordings.json")?
            .set_default("registry.key", "recordings")?
            .set_default("registry.mode", "remote")?
            .set_default("registry.url", "http://127.0.0.1:3000")?
            .set_default("recorder.backend", "file")?
            .set_default("recorder.source", "tests/fixtures/sample.wav")?
            .set_default("recorder.sample_rate", 44100)?
            .set_default("recorder.channels", 1)?
            .set_default("recorder.buffer_duration_ms", 1000)?
            .set_default("recorder.realtime", true)?
            .set_default("recorder.downloads_path", "recordings")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_RECORDER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}

impl RegistryConfig {
    pub fn path(&self) -> PathBuf {
        expand(&self.path)
    }
}

impl RecorderConfig {
    pub fn backend_config(&self) -> RecordingBackendConfig {
        RecordingBackendConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            buffer_duration_ms: self.buffer_duration_ms,
            realtime: self.realtime,
        }
    }

    pub fn audio_source(&self) -> AudioSource {
        match self.backend {
            BackendKind::File => AudioSource::File(expand(&self.source)),
            BackendKind::Microphone => AudioSource::Microphone,
        }
    }

    pub fn downloads_path(&self) -> PathBuf {
        expand(&self.downloads_path)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
