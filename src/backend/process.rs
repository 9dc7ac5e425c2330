//! Model adapters that delegate inference to an external command.
//!
//! Each adapter runs a configured argv and speaks JSON on stdout:
//!
//! | Adapter | stdin | stdout |
//! |---|---|---|
//! | transcription | 16-bit mono WAV | `{"text", "language", "segments"?}` |
//! | audio emotion | 16-bit mono WAV | `[{"label", "score"}, ...]` |
//! | text emotion | UTF-8 text | `[{"label", "score"}, ...]` |
//! | translation | `{"text", "source", "target"}` | `{"translated_text", "model"?}` |
//!
//! If any argument contains `{input}`, the input is written to a scratch
//! file instead and its path substituted; stdin is then empty.

use crate::audio::Waveform;
use crate::audio::codec::encode_wav;
use crate::backend::command::{CommandRunner, expand_args};
use crate::emotion::audio::map_audio_label;
use crate::emotion::text::{ensure_text, map_text_label};
use crate::emotion::{AudioEmotionClassifier, EmotionPrediction, TextEmotionClassifier};
use crate::error::{Result, VoxbridgeError};
use crate::language::Language;
use crate::stt::{Transcriber, TranscriptionResult, TranscriptionSegment};
use crate::translate::{TranslationResult, Translator};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const INPUT_PLACEHOLDER: &str = "{input}";

/// A configured model command plus the runner that executes it.
#[derive(Clone)]
pub struct ModelCommand {
    runner: Arc<dyn CommandRunner>,
    argv: Vec<String>,
    name: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ModelCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCommand")
            .field("argv", &self.argv)
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelCommand {
    /// The model name defaults to the program's file name.
    pub fn new(runner: Arc<dyn CommandRunner>, argv: Vec<String>) -> Self {
        let name = argv
            .first()
            .and_then(|p| std::path::Path::new(p).file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("command")
            .to_string();
        Self {
            runner,
            argv,
            name,
            timeout: None,
        }
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn uses_input_file(&self) -> bool {
        self.argv.iter().any(|a| a.contains(INPUT_PLACEHOLDER))
    }

    /// Run with `input`, via stdin or a scratch file as the argv dictates.
    fn invoke(&self, stage: &str, input: &[u8], suffix: &str) -> Result<Vec<u8>> {
        if !self.uses_input_file() {
            return self.runner.run(stage, &self.argv, input, self.timeout);
        }

        let mut scratch = tempfile::Builder::new()
            .prefix("voxbridge-")
            .suffix(suffix)
            .tempfile()?;
        scratch.write_all(input)?;
        scratch.flush()?;

        let path = scratch.path().to_string_lossy().to_string();
        let argv = expand_args(&self.argv, &[("input", &path)]);
        self.runner.run(stage, &argv, &[], self.timeout)
    }

    fn invoke_json<T: for<'de> Deserialize<'de>>(
        &self,
        stage: &str,
        input: &[u8],
        suffix: &str,
    ) -> Result<T> {
        let stdout = self.invoke(stage, input, suffix)?;
        serde_json::from_slice(&stdout).map_err(|e| {
            VoxbridgeError::backend(stage, format!("{} returned malformed JSON: {}", self.name, e))
        })
    }
}

fn wav_input(audio: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    encode_wav(&Waveform::new(audio.to_vec(), sample_rate))
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

fn prediction_from(labels: &[LabelScore], map: fn(&str) -> crate::emotion::Emotion) -> EmotionPrediction {
    EmotionPrediction::from_raw_labels(labels.iter().map(|l| (l.label.as_str(), l.score)), map)
}

#[derive(Debug, Deserialize)]
struct RawTranscription {
    text: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

/// Transcription via an external recognizer.
#[derive(Debug, Clone)]
pub struct ProcessTranscriber {
    command: ModelCommand,
}

impl ProcessTranscriber {
    pub fn new(command: ModelCommand) -> Self {
        Self { command }
    }
}

impl Transcriber for ProcessTranscriber {
    fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<TranscriptionResult> {
        let raw: RawTranscription =
            self.command
                .invoke_json("transcription", &wav_input(audio, sample_rate)?, ".wav")?;
        let duration = if sample_rate == 0 {
            0.0
        } else {
            audio.len() as f64 / sample_rate as f64
        };
        Ok(TranscriptionResult {
            text: raw.text,
            language: raw.language,
            duration,
            segments: raw.segments,
        })
    }

    fn model_name(&self) -> &str {
        self.command.name()
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Audio emotion via an external classifier.
#[derive(Debug, Clone)]
pub struct ProcessAudioEmotion {
    command: ModelCommand,
}

impl ProcessAudioEmotion {
    pub fn new(command: ModelCommand) -> Self {
        Self { command }
    }
}

impl AudioEmotionClassifier for ProcessAudioEmotion {
    fn predict(&self, audio: &[f32], sample_rate: u32) -> Result<EmotionPrediction> {
        let labels: Vec<LabelScore> =
            self.command
                .invoke_json("audio emotion", &wav_input(audio, sample_rate)?, ".wav")?;
        Ok(prediction_from(&labels, map_audio_label))
    }

    fn model_name(&self) -> &str {
        self.command.name()
    }
}

/// Text emotion via an external classifier.
#[derive(Debug, Clone)]
pub struct ProcessTextEmotion {
    command: ModelCommand,
}

impl ProcessTextEmotion {
    pub fn new(command: ModelCommand) -> Self {
        Self { command }
    }
}

impl TextEmotionClassifier for ProcessTextEmotion {
    fn predict(&self, text: &str) -> Result<EmotionPrediction> {
        ensure_text(text)?;
        let labels: Vec<LabelScore> =
            self.command
                .invoke_json("text emotion", text.as_bytes(), ".txt")?;
        Ok(prediction_from(&labels, map_text_label))
    }

    fn model_name(&self) -> &str {
        self.command.name()
    }
}

#[derive(Debug, Serialize)]
struct TranslationRequest<'a> {
    text: &'a str,
    source: Language,
    target: Language,
}

#[derive(Debug, Deserialize)]
struct RawTranslation {
    translated_text: String,
    #[serde(default)]
    model: Option<String>,
}

/// Translation via an external model.
#[derive(Debug, Clone)]
pub struct ProcessTranslator {
    command: ModelCommand,
}

impl ProcessTranslator {
    pub fn new(command: ModelCommand) -> Self {
        Self { command }
    }
}

impl Translator for ProcessTranslator {
    fn translate(&self, text: &str, source: Language, target: Language) -> Result<TranslationResult> {
        let request = serde_json::to_vec(&TranslationRequest {
            text,
            source,
            target,
        })
        .map_err(|e| VoxbridgeError::backend("translation", e.to_string()))?;

        let raw: RawTranslation = self.command.invoke_json("translation", &request, ".json")?;
        Ok(TranslationResult {
            translated_text: raw.translated_text,
            model: raw.model.unwrap_or_else(|| self.command.name().to_string()),
        })
    }

    fn model_name(&self) -> &str {
        self.command.name()
    }
}
