use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::backend::{AudioChunk, Encoding, PcmFormat};

/// Finalized recording, ready to play or download
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub encoding: Encoding,
    /// Known exactly for WAV; derived from chunk timestamps otherwise
    pub duration_secs: f64,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Assemble chunks, in order, into one artifact
    pub fn assemble(encoding: Encoding, format: PcmFormat, chunks: &[AudioChunk]) -> Result<Self> {
        let payload: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();

        let (bytes, duration_secs) = match encoding {
            Encoding::Wav => {
                let duration = if format.byte_rate() > 0 {
                    payload.len() as f64 / format.byte_rate() as f64
                } else {
                    0.0
                };
                (write_wav(format, &payload)?, duration)
            }
            Encoding::Mp3 | Encoding::Webm => {
                let duration = chunks
                    .last()
                    .map(|c| c.timestamp_ms as f64 / 1000.0)
                    .unwrap_or(0.0);
                (payload, duration)
            }
        };

        debug!(
            "Assembled {} artifact from {} chunks ({} bytes)",
            encoding.extension(),
            chunks.len(),
            bytes.len()
        );

        Ok(Self {
            bytes,
            encoding,
            duration_secs,
            created_at: Utc::now(),
        })
    }

    /// File name for a download: the given name, or a timestamped default
    pub fn file_name(&self, suggested: &str) -> String {
        let ext = self.encoding.extension();
        let stem: String = suggested
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
            .collect();

        let stem = if stem.is_empty() {
            format!("recording-{}", self.created_at.format("%Y-%m-%dT%H-%M-%S%.3fZ"))
        } else {
            stem
        };

        let suffix = format!(".{}", ext);
        if stem.to_ascii_lowercase().ends_with(&suffix) {
            stem
        } else {
            format!("{}{}", stem, suffix)
        }
    }

    /// Save the artifact into `dir`, returning the written path
    pub fn download(&self, suggested: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).context("Failed to create download directory")?;

        let path = dir.join(self.file_name(suggested));
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("Failed to write recording: {:?}", path))?;

        info!("Recording saved to {}", path.display());
        Ok(path)
    }
}

/// Wrap s16le PCM in a WAV container
fn write_wav(format: PcmFormat, pcm: &[u8]) -> Result<Vec<u8>> {
    if pcm.len() % 2 != 0 {
        bail!("PCM payload has a dangling byte ({} bytes)", pcm.len());
    }

    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for sample in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
                .context("Failed to write sample to WAV")?;
        }
        writer.finalize().context("Failed to finalize WAV")?;
    }

    Ok(cursor.into_inner())
}
