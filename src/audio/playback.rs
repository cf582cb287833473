//! Artifact playback
//!
//! Two sinks:
//! - `DecodeSink` decodes the whole artifact with symphonia and reports what it
//!   found. No audio leaves the process, which suits headless runs and tests.
//! - `CommandSink` hands the artifact to an external player (`aplay`,
//!   `afplay`, `ffplay -nodisp -autoexit`, ...).

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::process::Command;
use tracing::{debug, info};

use super::artifact::Artifact;

/// What a sink learned while playing
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub frames: u64,
    pub sample_rate: Option<u32>,
    pub duration_secs: Option<f64>,
}

#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, artifact: &Artifact) -> Result<PlaybackReport>;
}

/// Decode-only sink
#[derive(Debug, Default, Clone)]
pub struct DecodeSink;

#[async_trait::async_trait]
impl AudioSink for DecodeSink {
    async fn play(&self, artifact: &Artifact) -> Result<PlaybackReport> {
        let bytes = artifact.bytes.clone();
        let ext = artifact.encoding.extension();

        tokio::task::spawn_blocking(move || decode(bytes, ext))
            .await
            .context("Decode task panicked")?
    }
}

fn decode(bytes: Vec<u8>, ext: &str) -> Result<PlaybackReport> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(ext);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Unrecognized audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No playable audio track")?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Unsupported codec")?;

    let mut frames = 0u64;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(e).context("Failed to read packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            // Corrupt packets are skipped, as players do
            Err(SymphoniaError::DecodeError(e)) => debug!("Skipping bad packet: {}", e),
            Err(e) => return Err(e).context("Failed to decode packet"),
        }
    }

    let duration_secs = sample_rate.map(|rate| frames as f64 / rate as f64);
    debug!("Decoded {} frames", frames);

    Ok(PlaybackReport {
        frames,
        sample_rate,
        duration_secs,
    })
}

/// Sink that runs an external player on a temporary copy of the artifact
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    /// Build from a command line such as `"ffplay -nodisp -autoexit"`
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().context("Empty player command")?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait::async_trait]
impl AudioSink for CommandSink {
    async fn play(&self, artifact: &Artifact) -> Result<PlaybackReport> {
        let file = tempfile::Builder::new()
            .prefix("voice-recorder-")
            .suffix(&format!(".{}", artifact.encoding.extension()))
            .tempfile()
            .context("Failed to create temporary file")?;
        tokio::fs::write(file.path(), &artifact.bytes)
            .await
            .context("Failed to write temporary file")?;

        info!("Playing with {}", self.program);

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }

        Ok(PlaybackReport {
            frames: 0,
            sample_rate: None,
            duration_secs: Some(artifact.duration_secs),
        })
    }
}
