//! voxbridge - Emotion-aware speech-to-speech translation
//!
//! Transcribes spoken English, Telugu or Hindi, reads the speaker's emotion
//! from voice and words, translates, and speaks the result back in the
//! detected emotion.

// Enforce error handling discipline: propagate, don't panic
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod backend;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod daemon;
pub mod defaults;
pub mod dialect;
pub mod emotion;
pub mod error;
pub mod ipc;
pub mod language;
pub mod logging;
pub mod pipeline;
pub mod stt;
pub mod translate;
pub mod tts;

// Adapter seams
pub use backend::{CommandRunner, SystemCommandRunner};
pub use emotion::{AudioEmotionClassifier, TextEmotionClassifier};
pub use stt::transcriber::Transcriber;
pub use translate::Translator;
pub use tts::VoiceEngine;

// Pipeline
pub use pipeline::{Pipeline, PipelineResult, PipelineSettings, ServiceContext};

// Domain types
pub use dialect::{Dialect, DialectPrediction};
pub use emotion::{Emotion, EmotionPrediction};
pub use language::Language;

// Error handling
pub use error::{ErrorKind, Result, VoxbridgeError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
