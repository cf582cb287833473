// Default-input-device backend built on cpal
//
// cpal streams are not Send, so each capture owns a dedicated thread that
// builds the stream, forwards samples and drops the stream when told to stop.

use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat, StreamConfig};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::backend::{
    AudioChunk, DeviceAvailability, Encoding, PcmFormat, RecordingBackend, RecordingBackendConfig,
};
use crate::error::{AccessError, RecorderError};

pub struct MicrophoneBackend {
    config: RecordingBackendConfig,
    format: PcmFormat,
    capture: Option<Capture>,
}

struct Capture {
    stop_tx: std_mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl MicrophoneBackend {
    pub fn new(config: RecordingBackendConfig) -> Self {
        let format = PcmFormat {
            sample_rate: config.sample_rate,
            channels: config.channels,
        };

        Self {
            config,
            format,
            capture: None,
        }
    }
}

fn classify(e: BuildStreamError) -> AccessError {
    match e {
        BuildStreamError::DeviceNotAvailable => AccessError::Busy,
        BuildStreamError::BackendSpecific { err } => {
            let description = err.description.to_ascii_lowercase();
            if description.contains("permission") || description.contains("denied") {
                AccessError::Denied
            } else if description.contains("busy") {
                AccessError::Busy
            } else {
                AccessError::Other(err.description)
            }
        }
        other => AccessError::Other(other.to_string()),
    }
}

/// Accumulates callback data into fixed-size chunks
struct ChunkBuffer {
    samples: Vec<i16>,
    samples_per_chunk: usize,
    sent_ms: u64,
    chunk_ms: u64,
    tx: mpsc::Sender<AudioChunk>,
}

impl ChunkBuffer {
    fn push(&mut self, data: impl Iterator<Item = i16>) {
        self.samples.extend(data);
        while self.samples.len() >= self.samples_per_chunk {
            let rest = self.samples.split_off(self.samples_per_chunk);
            let full = std::mem::replace(&mut self.samples, rest);
            self.send(&full);
        }
    }

    fn send(&mut self, samples: &[i16]) {
        // The audio callback must never block
        if let Err(e) = self.tx.try_send(AudioChunk::from_samples(samples, self.sent_ms)) {
            warn!("Dropping microphone chunk: {}", e);
        }
        self.sent_ms += self.chunk_ms;
    }

    fn flush(&mut self) {
        if !self.samples.is_empty() {
            let rest = std::mem::take(&mut self.samples);
            self.send(&rest);
        }
    }
}

#[async_trait::async_trait]
impl RecordingBackend for MicrophoneBackend {
    async fn probe(&self) -> DeviceAvailability {
        let host = cpal::default_host();
        match host.input_devices() {
            Ok(mut devices) => {
                if devices.next().is_some() {
                    DeviceAvailability::Available
                } else {
                    DeviceAvailability::Unavailable
                }
            }
            Err(e) => {
                warn!("Input device enumeration failed: {}", e);
                DeviceAvailability::ApiUnsupported
            }
        }
    }

    async fn request_access(&mut self) -> Result<(), AccessError> {
        tokio::task::spawn_blocking(|| -> Result<(), AccessError> {
            let device = cpal::default_host()
                .default_input_device()
                .ok_or(AccessError::NotFound)?;
            let supported = device
                .default_input_config()
                .map_err(|e| AccessError::Other(e.to_string()))?;
            let config: StreamConfig = supported.into();

            // Building the stream is what triggers the OS permission prompt
            let stream = device
                .build_input_stream(
                    &config,
                    |_data: &[f32], _: &cpal::InputCallbackInfo| {},
                    |err| error!("Audio input stream error: {}", err),
                    None,
                )
                .map_err(classify)?;
            drop(stream);
            Ok(())
        })
        .await
        .map_err(|e| AccessError::Other(e.to_string()))?
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, RecorderError> {
        if self.capture.is_some() {
            return Err(RecorderError::BackendStart("Already capturing".to_string()));
        }

        let (tx, rx) = mpsc::channel(100);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<PcmFormat, RecorderError>>();
        let chunk_ms = self.config.buffer_duration_ms;

        let thread = std::thread::spawn(move || {
            let opened = (|| -> Result<(cpal::Stream, PcmFormat), RecorderError> {
                let device = cpal::default_host()
                    .default_input_device()
                    .ok_or(RecorderError::DeviceUnavailable)?;
                let supported = device
                    .default_input_config()
                    .map_err(|e| RecorderError::BackendStart(e.to_string()))?;
                let sample_format = supported.sample_format();
                let config: StreamConfig = supported.into();
                let format = PcmFormat {
                    sample_rate: config.sample_rate.0,
                    channels: config.channels,
                };

                let samples_per_chunk = ((format.sample_rate as u64 * chunk_ms / 1000).max(1)
                    * format.channels as u64) as usize;
                let mut buffer = ChunkBuffer {
                    samples: Vec::with_capacity(samples_per_chunk),
                    samples_per_chunk,
                    sent_ms: 0,
                    chunk_ms,
                    tx,
                };
                let err_fn = |err: cpal::StreamError| error!("Audio input stream error: {}", err);

                let stream = match sample_format {
                    SampleFormat::I16 => device.build_input_stream(
                        &config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            buffer.push(data.iter().copied())
                        },
                        err_fn,
                        None,
                    ),
                    SampleFormat::F32 => device.build_input_stream(
                        &config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            buffer.push(
                                data.iter().map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                            )
                        },
                        err_fn,
                        None,
                    ),
                    other => {
                        return Err(RecorderError::BackendStart(format!(
                            "Unsupported sample format: {:?}",
                            other
                        )))
                    }
                }
                .map_err(|e| RecorderError::from(classify(e)))?;

                stream
                    .play()
                    .map_err(|e| RecorderError::BackendStart(e.to_string()))?;
                Ok((stream, format))
            })();

            match opened {
                Ok((stream, format)) => {
                    let _ = ready_tx.send(Ok(format));
                    // Either a stop request or the backend being dropped ends capture
                    let _ = stop_rx.recv();
                    let _ = stream.pause();
                    drop(stream);
                    debug!("Microphone stream released");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            }
        });

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| RecorderError::BackendStart(e.to_string()))?
            .map_err(|_| RecorderError::BackendStart("Capture thread exited".to_string()))?;

        match ready {
            Ok(format) => {
                info!(
                    "Microphone capture started ({}Hz, {} channels)",
                    format.sample_rate, format.channels
                );
                self.format = format;
                self.capture = Some(Capture { stop_tx, thread });
                Ok(rx)
            }
            Err(e) => {
                let _ = thread.join();
                Err(e)
            }
        }
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        let Some(capture) = self.capture.take() else {
            return Ok(());
        };

        let _ = capture.stop_tx.send(());
        tokio::task::spawn_blocking(move || capture.thread.join())
            .await
            .map_err(|e| RecorderError::BackendStop(e.to_string()))?
            .map_err(|_| RecorderError::BackendStop("Capture thread panicked".to_string()))?;

        info!("Microphone capture stopped");
        Ok(())
    }

    fn encoding(&self) -> Encoding {
        Encoding::Wav
    }

    fn format(&self) -> PcmFormat {
        self.format
    }

    fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

impl Drop for ChunkBuffer {
    fn drop(&mut self) {
        self.flush();
    }
}
