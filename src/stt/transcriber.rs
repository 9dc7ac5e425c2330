use crate::defaults;
use crate::error::{Result, VoxbridgeError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One timed span of recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    pub text: String,
}

/// Output of a transcription backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    /// Language code as reported by the recognizer. Not yet coerced to a
    /// supported language; the orchestrator does that.
    pub language: String,
    /// Duration of the transcribed audio in seconds.
    pub duration: f64,
    #[serde(default)]
    pub segments: Vec<TranscriptionSegment>,
}

impl TranscriptionResult {
    /// A result whose single segment spans the whole input.
    pub fn single_segment(text: &str, language: &str, duration: f64) -> Self {
        Self {
            text: text.to_string(),
            language: language.to_string(),
            duration,
            segments: vec![TranscriptionSegment {
                start: 0.0,
                end: duration,
                text: text.to_string(),
            }],
        }
    }
}

/// Trait for speech-to-text transcription.
///
/// Implementations are blocking; the orchestrator dispatches calls onto the
/// blocking pool.
pub trait Transcriber: Send + Sync {
    /// Transcribe mono float samples at `sample_rate`.
    fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<TranscriptionResult>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across requests.
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<TranscriptionResult> {
        (**self).transcribe(audio, sample_rate)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

fn duration_of(audio: &[f32], sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        0.0
    } else {
        audio.len() as f64 / sample_rate as f64
    }
}

/// Stand-in used when no transcription model is configured.
///
/// Always answers with a fixed English sentence so the rest of the pipeline
/// can be exercised end to end.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderTranscriber;

impl Transcriber for PlaceholderTranscriber {
    fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<TranscriptionResult> {
        Ok(TranscriptionResult::single_segment(
            defaults::PLACEHOLDER_TRANSCRIPT,
            "en",
            duration_of(audio, sample_rate),
        ))
    }

    fn model_name(&self) -> &str {
        "placeholder"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    model_name: String,
    response: String,
    language: String,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            language: "en".to_string(),
            should_fail: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the detected language code reported back
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Block for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of transcribe calls so far, shared between clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<TranscriptionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxbridgeError::backend(
                "transcription",
                "mock transcription failure",
            ));
        }
        Ok(TranscriptionResult::single_segment(
            &self.response,
            &self.language,
            duration_of(audio, sample_rate),
        ))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
