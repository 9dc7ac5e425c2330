//! Error types for voxbridge.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A bounded, independently timed step of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Transcription and audio emotion, run concurrently.
    SttEmotion,
    /// Optional English text emotion.
    TextEmotion,
    Translation,
    Synthesis,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::SttEmotion => "STT + emotion",
            Phase::TextEmotion => "text emotion",
            Phase::Translation => "translation",
            Phase::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

/// Coarse classification used by the request layer to pick a status signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller sent something unusable. Never retried.
    InvalidInput,
    /// A bounded operation ran out of time.
    Timeout,
    /// An adapter failed for reasons other than time.
    Backend,
    /// A required adapter is not loaded.
    Unavailable,
}

#[derive(Error, Debug)]
pub enum VoxbridgeError {
    // Input validation errors
    #[error("Invalid audio: {message}")]
    InvalidAudio { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // Timeouts
    #[error("{phase} phase exceeded time limit of {timeout_ms}ms")]
    PhaseTimeout { phase: Phase, timeout_ms: u64 },

    #[error("End-to-end translation exceeded {timeout_ms}ms timeout limit")]
    PipelineTimeout { timeout_ms: u64 },

    // Backend errors
    #[error("{stage} backend failed: {message}")]
    Backend { stage: String, message: String },

    #[error("{stage} backend is not available: {message}")]
    BackendUnavailable { stage: String, message: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoxbridgeError {
    /// Shorthand for a backend failure in the named stage.
    pub fn backend(stage: &str, message: impl Into<String>) -> Self {
        VoxbridgeError::Backend {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for an input validation failure.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        VoxbridgeError::InvalidInput {
            message: message.into(),
        }
    }

    /// Which of the four caller-visible categories this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VoxbridgeError::InvalidAudio { .. } | VoxbridgeError::InvalidInput { .. } => {
                ErrorKind::InvalidInput
            }
            VoxbridgeError::PhaseTimeout { .. } | VoxbridgeError::PipelineTimeout { .. } => {
                ErrorKind::Timeout
            }
            VoxbridgeError::BackendUnavailable { .. } => ErrorKind::Unavailable,
            VoxbridgeError::Backend { .. }
            | VoxbridgeError::ConfigInvalidValue { .. }
            | VoxbridgeError::Config(_)
            | VoxbridgeError::IpcSocket { .. }
            | VoxbridgeError::IpcProtocol { .. }
            | VoxbridgeError::IpcConnection { .. }
            | VoxbridgeError::Io(_) => ErrorKind::Backend,
        }
    }
}

pub type Result<T> = std::result::Result<T, VoxbridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_invalid_audio_display() {
        let error = VoxbridgeError::InvalidAudio {
            message: "Decoded audio is empty.".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid audio: Decoded audio is empty.");
    }

    #[test]
    fn test_phase_timeout_display_names_phase() {
        let error = VoxbridgeError::PhaseTimeout {
            phase: Phase::Translation,
            timeout_ms: 1500,
        };
        assert_eq!(
            error.to_string(),
            "translation phase exceeded time limit of 1500ms"
        );
    }

    #[test]
    fn test_backend_display() {
        let error = VoxbridgeError::backend("transcription", "out of memory");
        assert_eq!(error.to_string(), "transcription backend failed: out of memory");
    }

    #[test]
    fn test_kind_separates_input_timeout_and_backend() {
        assert_eq!(
            VoxbridgeError::invalid_input("bad").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            VoxbridgeError::InvalidAudio {
                message: "x".to_string()
            }
            .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            VoxbridgeError::PhaseTimeout {
                phase: Phase::SttEmotion,
                timeout_ms: 1
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            VoxbridgeError::PipelineTimeout { timeout_ms: 1 }.kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            VoxbridgeError::backend("translation", "boom").kind(),
            ErrorKind::Backend
        );
        assert_eq!(
            VoxbridgeError::BackendUnavailable {
                stage: "synthesis".to_string(),
                message: "no engine".to_string()
            }
            .kind(),
            ErrorKind::Unavailable
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VoxbridgeError = io_error.into();
        assert!(error.to_string().contains("file not found"));
        assert_eq!(error.kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: VoxbridgeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VoxbridgeError>();
        assert_sync::<VoxbridgeError>();
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InvalidInput).unwrap();
        assert_eq!(json, "\"invalid_input\"");
    }
}
