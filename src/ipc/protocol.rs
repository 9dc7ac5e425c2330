//! JSON message protocol between CLI and daemon.
//!
//! One command per connection, one JSON object per line. Audio travels by
//! path: client and daemon share a filesystem.

use crate::dialect::DialectPrediction;
use crate::emotion::EmotionPrediction;
use crate::error::{ErrorKind, VoxbridgeError};
use crate::pipeline::{HealthReport, PipelineResult};
use crate::stt::TranscriptionResult;
use crate::translate::TranslationResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_emotion() -> String {
    "neutral".to_string()
}

/// Commands sent by CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Full speech-to-speech run
    TranslateSpeech {
        audio_path: PathBuf,
        target_lang: String,
    },
    Transcribe {
        audio_path: PathBuf,
    },
    DetectEmotion {
        audio_path: PathBuf,
    },
    DetectDialect {
        text: String,
    },
    TranslateText {
        text: String,
        source_lang: String,
        target_lang: String,
    },
    /// Synthesize speech; without `output` the daemon writes into its
    /// outputs directory.
    Synthesize {
        text: String,
        language: String,
        #[serde(default = "default_emotion")]
        emotion: String,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    Health,
    FetchOutput {
        session_id: String,
    },
    Shutdown,
}

impl Command {
    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize command from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Responses sent by daemon to CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Pipeline { result: PipelineResult },
    Transcription { result: TranscriptionResult },
    Emotion { prediction: EmotionPrediction },
    Dialect { prediction: DialectPrediction },
    Translation { result: TranslationResult },
    /// Synthesized audio was written to `path`
    Audio { path: PathBuf, bytes: u64 },
    Health { report: HealthReport },
    Output { path: PathBuf },
    /// `kind` tells "bad input" from "too slow" from "broken"
    Error { kind: ErrorKind, message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl From<VoxbridgeError> for Response {
    fn from(error: VoxbridgeError) -> Self {
        Response::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
