//! Error types for the recorder and the registry
//!
//! `Display` output of every variant is the message shown to the user, so
//! callers can surface `err.to_string()` directly.

use thiserror::Error;

/// Why a backend could not open the input device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No input device exists (or the source file is missing)
    #[error("input device not found")]
    NotFound,

    /// The user or the OS refused access
    #[error("access denied")]
    Denied,

    /// Another process holds the device
    #[error("device busy")]
    Busy,

    #[error("{0}")]
    Other(String),
}

/// Recorder errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("No microphone was found. Connect an audio input device and try again.")]
    DeviceUnavailable,

    #[error("Audio recording is not supported on this platform.")]
    ApiUnsupported,

    #[error("Microphone access was denied. Please allow microphone access to record audio.")]
    PermissionDenied,

    #[error("The microphone is already in use by another application.")]
    DeviceBusy,

    /// Permission request failed for a reason that fits no other category
    #[error("Could not access the microphone: {0}")]
    AccessFailed(String),

    #[error("Recording could not be started: {0}")]
    BackendStart(String),

    #[error("Recording failed. Please try again. ({0})")]
    BackendStop(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("{0}")]
    Validation(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Saving the recording failed: {0}")]
    Persist(#[from] RegistryError),
}

impl From<AccessError> for RecorderError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::NotFound => RecorderError::DeviceUnavailable,
            AccessError::Denied => RecorderError::PermissionDenied,
            AccessError::Busy => RecorderError::DeviceBusy,
            AccessError::Other(msg) => RecorderError::AccessFailed(msg),
        }
    }
}

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to read the registry: {0}")]
    Read(String),

    #[error("Failed to write the registry: {0}")]
    Write(String),

    /// Transport failure talking to a remote registry
    #[error("Network error: {0}")]
    Network(String),

    /// A remote registry answered with a non-success status
    #[error("Registry responded {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl RegistryError {
    pub fn name_required() -> Self {
        RegistryError::Validation("Name is required".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_errors_map_to_distinct_categories() {
        assert_eq!(RecorderError::from(AccessError::NotFound), RecorderError::DeviceUnavailable);
        assert_eq!(RecorderError::from(AccessError::Denied), RecorderError::PermissionDenied);
        assert_eq!(RecorderError::from(AccessError::Busy), RecorderError::DeviceBusy);
        assert_eq!(
            RecorderError::from(AccessError::Other("driver crashed".into())),
            RecorderError::AccessFailed("driver crashed".into())
        );
    }

    #[test]
    fn test_not_found_and_denied_messages_differ() {
        let not_found = RecorderError::DeviceUnavailable.to_string();
        let denied = RecorderError::PermissionDenied.to_string();

        assert_ne!(not_found, denied);
        assert!(not_found.contains("No microphone"));
        assert!(denied.contains("denied"));
    }

    #[test]
    fn test_persist_wraps_registry_message() {
        let err = RecorderError::from(RegistryError::Write("disk full".into()));
        assert_eq!(
            err.to_string(),
            "Saving the recording failed: Failed to write the registry: disk full"
        );
    }
}
