//! Single-stage operations exposed next to the full run.
//!
//! Each one applies the same input validation and phase timeout the full
//! run applies to that stage.

use crate::audio::{Waveform, normalize_audio};
use crate::dialect::DialectPrediction;
use crate::emotion::EmotionPrediction;
use crate::error::{Phase, Result, VoxbridgeError};
use crate::pipeline::orchestrator::{Pipeline, blocking, within};
use crate::pipeline::types::Enhancement;
use crate::stt::TranscriptionResult;
use crate::translate::TranslationResult;
use crate::tts::SynthesisRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Which adapters are loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub transcriber: String,
    pub transcriber_ready: bool,
    pub audio_emotion: String,
    pub text_emotion: Option<String>,
    pub translator: String,
    /// Configured voice tiers in order; empty when synthesis is disabled.
    pub synthesis_engines: Vec<String>,
}

impl HealthReport {
    /// True when every essential adapter can serve requests.
    pub fn is_ready(&self) -> bool {
        self.transcriber_ready
    }
}

impl Pipeline {
    async fn decode(&self, audio: Vec<u8>) -> Result<Arc<Waveform>> {
        let wave = blocking("normalization", move || normalize_audio(&audio)).await?;
        Ok(Arc::new(wave))
    }

    /// Transcribe audio without translating it.
    ///
    /// Silent input returns an empty transcript in the default language
    /// without calling the transcriber.
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<TranscriptionResult> {
        let wave = self.decode(audio).await?;
        if self.settings().silence.is_untranscribable(wave.samples()) {
            return Ok(TranscriptionResult {
                text: String::new(),
                language: self.settings().pipeline.default_language.code().to_string(),
                duration: wave.duration_secs(),
                segments: Vec::new(),
            });
        }
        within(
            Phase::SttEmotion,
            self.settings().pipeline.stt_emotion_timeout_ms,
            self.transcribe_wave(wave),
        )
        .await
    }

    /// Classify the emotion carried by audio.
    pub async fn detect_emotion(&self, audio: Vec<u8>) -> Result<EmotionPrediction> {
        let wave = self.decode(audio).await?;
        within(
            Phase::SttEmotion,
            self.settings().pipeline.stt_emotion_timeout_ms,
            self.classify_wave(wave),
        )
        .await
    }

    pub fn detect_dialect(&self, text: &str) -> DialectPrediction {
        self.context().dialect.detect(text)
    }

    /// Translate text between caller-supplied language codes.
    ///
    /// # Errors
    /// `InvalidInput` for empty text or unsupported codes; identical codes
    /// return the text unchanged without a backend call.
    pub async fn translate_text(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslationResult> {
        let service = self.context().translator.clone();
        let (text, source, target) = (text.to_string(), source.to_string(), target.to_string());
        within(
            Phase::Translation,
            self.settings().pipeline.translation_timeout_ms,
            blocking("translation", move || {
                service.translate_codes(&text, &source, &target)
            }),
        )
        .await
    }

    /// Synthesize WAV bytes for caller-supplied text.
    ///
    /// The request is validated before any engine is touched. Without a
    /// loaded synthesizer the fallback is built; unlike a full run, its
    /// failure is returned to the caller.
    pub async fn synthesize(&self, text: &str, language: &str, emotion: &str) -> Result<Vec<u8>> {
        let request = SynthesisRequest::parse(text, language, emotion)?;
        let timeout_ms = self.settings().pipeline.synthesis_timeout_ms;

        match &self.context().synthesizer {
            Some(synthesizer) => {
                let synthesizer = synthesizer.clone();
                within(
                    Phase::Synthesis,
                    timeout_ms,
                    blocking("synthesis", move || synthesizer.synthesize(&request)),
                )
                .await
            }
            None => match self.fallback_synthesis(request).await {
                Enhancement::Produced(speech) => Ok(speech),
                Enhancement::TimedOut => Err(VoxbridgeError::PhaseTimeout {
                    phase: Phase::Synthesis,
                    timeout_ms,
                }),
                Enhancement::Failed(e) => Err(e),
            },
        }
    }

    pub fn health(&self) -> HealthReport {
        let context = self.context();
        HealthReport {
            transcriber: context.transcriber.model_name().to_string(),
            transcriber_ready: context.transcriber.is_ready(),
            audio_emotion: context.audio_emotion.model_name().to_string(),
            text_emotion: context
                .text_emotion
                .as_ref()
                .map(|t| t.model_name().to_string()),
            translator: context.translator.model_name().to_string(),
            synthesis_engines: context
                .synthesizer
                .as_ref()
                .map(|s| s.engine_names())
                .unwrap_or_default(),
        }
    }

    /// Path of the artifact written for `session_id`.
    pub fn fetch_output(&self, session_id: &str) -> Result<PathBuf> {
        self.store().lookup(session_id)
    }
}
