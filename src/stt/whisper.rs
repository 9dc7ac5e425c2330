//! Whisper-based speech-to-text transcription.
//!
//! This module provides a Whisper implementation of the Transcriber trait using whisper-rs.
//!
//! # Feature Gate
//!
//! Real inference requires the `whisper` feature (and cmake at build time):
//!
//! ```bash
//! cargo build --features whisper
//! ```
//!
//! Without it, [`WhisperTranscriber`] still validates its model path but
//! every transcription fails with a backend-unavailable error.

use crate::error::{Result, VoxbridgeError};
use crate::stt::transcriber::{Transcriber, TranscriptionResult};
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use crate::audio::resample::resample_poly;
#[cfg(feature = "whisper")]
use crate::defaults::SAMPLE_RATE;
#[cfg(feature = "whisper")]
use crate::stt::transcriber::TranscriptionSegment;
#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for Whisper transcriber.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the ggml model file
    pub model_path: PathBuf,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            threads: None,
        }
    }
}

fn model_name_from_path(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Whisper-based transcriber with automatic language detection.
///
/// The WhisperContext is wrapped in a Mutex; concurrent requests serialize
/// on inference.
#[cfg(feature = "whisper")]
pub struct WhisperTranscriber {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper transcriber stub for builds without the `whisper` feature.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    model_name: String,
}

fn missing_model(config: &WhisperConfig) -> VoxbridgeError {
    VoxbridgeError::BackendUnavailable {
        stage: "transcription".to_string(),
        message: format!(
            "Whisper model not found at {}",
            config.model_path.display()
        ),
    }
}

#[cfg(feature = "whisper")]
impl WhisperTranscriber {
    /// Load a Whisper model.
    ///
    /// # Errors
    /// Returns `VoxbridgeError::BackendUnavailable` if the model file doesn't
    /// exist and `VoxbridgeError::Backend` if loading it fails.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(missing_model(&config));
        }

        let model_name = model_name_from_path(&config.model_path);

        let mut context_params = WhisperContextParameters::default();
        context_params.flash_attn(true);
        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| VoxbridgeError::backend("transcription", "Invalid UTF-8 in model path"))?;
        let context = WhisperContext::new_with_params(path, context_params).map_err(|e| {
            VoxbridgeError::backend(
                "transcription",
                format!("Failed to load Whisper model: {}", e),
            )
        })?;

        tracing::info!(model = %model_name, "Loaded Whisper model");

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperTranscriber {
    /// Validate the model path (stub implementation).
    pub fn new(config: WhisperConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(missing_model(&config));
        }

        let model_name = model_name_from_path(&config.model_path);
        Ok(Self { config, model_name })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(feature = "whisper")]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<TranscriptionResult> {
        let resampled;
        let samples = if sample_rate == SAMPLE_RATE {
            audio
        } else {
            resampled = resample_poly(audio, sample_rate, SAMPLE_RATE);
            &resampled
        };
        let duration = samples.len() as f64 / SAMPLE_RATE as f64;

        let context = self.context.lock().map_err(|e| {
            VoxbridgeError::backend(
                "transcription",
                format!("Failed to acquire context lock: {}", e),
            )
        })?;

        let mut state = context.create_state().map_err(|e| {
            VoxbridgeError::backend(
                "transcription",
                format!("Failed to create Whisper state: {}", e),
            )
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(None);
        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state.full(params, samples).map_err(|e| {
            VoxbridgeError::backend("transcription", format!("Whisper inference failed: {}", e))
        })?;

        let lang_id = state.full_lang_id_from_state();
        let language = whisper_rs::get_lang_str(lang_id).unwrap_or("").to_string();

        let mut text = String::new();
        let mut segments = Vec::new();
        for segment in state.as_iter() {
            let segment_text = segment.to_string();
            text.push_str(&segment_text);
            // Timestamps are in centiseconds
            segments.push(TranscriptionSegment {
                start: segment.start_timestamp() as f64 / 100.0,
                end: segment.end_timestamp() as f64 / 100.0,
                text: segment_text.trim().to_string(),
            });
        }

        Ok(TranscriptionResult {
            text: text.trim().to_string(),
            language,
            duration,
            segments,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, _audio: &[f32], _sample_rate: u32) -> Result<TranscriptionResult> {
        Err(VoxbridgeError::BackendUnavailable {
            stage: "transcription".to_string(),
            message: "Whisper feature not enabled. Rebuild with --features whisper".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}
