//! Speech synthesis with ordered engine tiers.
//!
//! A [`Synthesizer`] holds the permitted tiers in preference order and tries
//! each until one produces audio. Emotion only changes delivery speed: the
//! engine's waveform is time-scaled by [`Emotion::speed_factor`].

pub mod neural;
pub mod system;
pub mod tone;

pub use neural::NeuralVoiceEngine;
pub use system::SystemVoiceEngine;
pub use tone::ToneEngine;

use crate::audio::Waveform;
use crate::audio::resample::stretch;
use crate::audio::codec::encode_wav;
use crate::backend::CommandRunner;
use crate::config::SynthesisConfig;
use crate::emotion::Emotion;
use crate::error::{Result, VoxbridgeError};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A validated synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: Language,
    pub emotion: Emotion,
}

impl SynthesisRequest {
    pub fn new(text: &str, language: Language, emotion: Emotion) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(VoxbridgeError::invalid_input("Text must be a non-empty string."));
        }
        Ok(Self {
            text: text.to_string(),
            language,
            emotion,
        })
    }

    /// Validate caller-supplied strings before any engine is touched.
    ///
    /// # Errors
    /// `VoxbridgeError::InvalidInput` for empty text, an unsupported
    /// language code or an unknown emotion.
    pub fn parse(text: &str, language: &str, emotion: &str) -> Result<Self> {
        let language = Language::parse(language)?;
        let emotion = emotion.parse::<Emotion>()?;
        Self::new(text, language, emotion)
    }
}

/// One way of turning text into speech.
///
/// Blocking. Engines ignore emotion unless they can condition on it; the
/// speed transform is applied by the [`Synthesizer`].
pub trait VoiceEngine: Send + Sync {
    fn synthesize(&self, text: &str, language: Language, emotion: Emotion) -> Result<Waveform>;

    fn name(&self) -> &str;
}

impl<T: VoiceEngine + ?Sized> VoiceEngine for Arc<T> {
    fn synthesize(&self, text: &str, language: Language, emotion: Emotion) -> Result<Waveform> {
        (**self).synthesize(text, language, emotion)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Engine tiers that configuration may enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceTier {
    /// External neural TTS writing raw PCM.
    Neural,
    /// OS voice command writing WAV.
    System,
    /// Deterministic tone generator. Always available.
    Tone,
}

impl VoiceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            VoiceTier::Neural => "neural",
            VoiceTier::System => "system",
            VoiceTier::Tone => "tone",
        }
    }
}

/// Time-scale `wave` for `emotion`.
///
/// Output length is `max(1, floor(len / speed))`; neutral is a no-op.
pub fn apply_speed(wave: Waveform, emotion: Emotion) -> Waveform {
    let speed = emotion.speed_factor();
    if speed == 1.0 || wave.is_empty() {
        return wave;
    }

    let target_len = ((wave.len() as f64 / speed).floor() as usize).max(1);
    if target_len == wave.len() {
        return wave;
    }

    let rate = wave.sample_rate();
    Waveform::new(stretch(wave.samples(), target_len), rate)
}

/// Ordered list of voice engines with tier fallback.
#[derive(Clone)]
pub struct Synthesizer {
    engines: Vec<Arc<dyn VoiceEngine>>,
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("engines", &self.engine_names())
            .finish()
    }
}

impl Synthesizer {
    pub fn new(engines: Vec<Arc<dyn VoiceEngine>>) -> Self {
        Self { engines }
    }

    /// Build the configured tiers, in configured order.
    ///
    /// The neural tier is skipped when no command is configured. Command
    /// tiers are killed once they run past `timeout`.
    pub fn from_config(
        config: &SynthesisConfig,
        runner: Arc<dyn CommandRunner>,
        timeout: Option<Duration>,
    ) -> Self {
        let mut engines: Vec<Arc<dyn VoiceEngine>> = Vec::new();
        for tier in &config.tiers {
            match tier {
                VoiceTier::Neural => match &config.neural_command {
                    Some(argv) if !argv.is_empty() => {
                        let mut engine = NeuralVoiceEngine::new(
                            runner.clone(),
                            argv.clone(),
                            config.neural_sample_rate,
                        );
                        if let Some(limit) = timeout {
                            engine = engine.with_timeout(limit);
                        }
                        engines.push(Arc::new(engine));
                    }
                    _ => tracing::debug!("Neural voice tier enabled but no command configured"),
                },
                VoiceTier::System => {
                    let mut engine =
                        SystemVoiceEngine::new(runner.clone(), config.system_command.clone());
                    if let Some(limit) = timeout {
                        engine = engine.with_timeout(limit);
                    }
                    engines.push(Arc::new(engine));
                }
                VoiceTier::Tone => engines.push(Arc::new(ToneEngine::new())),
            }
        }
        Self::new(engines)
    }

    /// Tone-only synthesizer, used as the last-resort fallback.
    pub fn tone_only() -> Self {
        Self::new(vec![Arc::new(ToneEngine::new())])
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.name().to_string()).collect()
    }

    /// Synthesize `request` into WAV bytes.
    ///
    /// # Errors
    /// The last engine's error when every tier fails, or
    /// `VoxbridgeError::BackendUnavailable` when no tier is configured.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        let wave = self.synthesize_waveform(request)?;
        encode_wav(&wave)
    }

    /// Like [`Synthesizer::synthesize`] but returns the speed-adjusted waveform.
    pub fn synthesize_waveform(&self, request: &SynthesisRequest) -> Result<Waveform> {
        let mut last_error = None;

        for engine in &self.engines {
            match engine.synthesize(&request.text, request.language, request.emotion) {
                Ok(wave) if !wave.is_empty() => {
                    tracing::debug!(
                        engine = engine.name(),
                        samples = wave.len(),
                        "Synthesized speech"
                    );
                    return Ok(apply_speed(wave, request.emotion));
                }
                Ok(_) => {
                    tracing::warn!(engine = engine.name(), "Voice engine produced no audio, trying next tier");
                    last_error = Some(VoxbridgeError::backend(
                        "synthesis",
                        format!("{} produced no audio", engine.name()),
                    ));
                }
                Err(e) => {
                    tracing::warn!(engine = engine.name(), error = %e, "Voice engine failed, trying next tier");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| VoxbridgeError::BackendUnavailable {
            stage: "synthesis".to_string(),
            message: "no voice engine configured".to_string(),
        }))
    }
}

/// Mock voice engine for testing
#[derive(Debug, Clone)]
pub struct MockVoiceEngine {
    name: String,
    samples: usize,
    sample_rate: u32,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockVoiceEngine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            samples: 1600,
            sample_rate: 16000,
            should_fail: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of samples in the produced waveform.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VoiceEngine for MockVoiceEngine {
    fn synthesize(&self, _text: &str, _language: Language, _emotion: Emotion) -> Result<Waveform> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxbridgeError::backend("synthesis", "mock synthesis failure"));
        }
        Ok(Waveform::new(vec![0.25; self.samples], self.sample_rate))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
