//! Audio emotion classification.

use crate::emotion::{Emotion, EmotionPrediction};
use crate::error::{Result, VoxbridgeError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Predicts an emotion from mono float samples.
///
/// Blocking, like [`crate::stt::Transcriber`].
pub trait AudioEmotionClassifier: Send + Sync {
    fn predict(&self, audio: &[f32], sample_rate: u32) -> Result<EmotionPrediction>;

    fn model_name(&self) -> &str;
}

impl<T: AudioEmotionClassifier + ?Sized> AudioEmotionClassifier for Arc<T> {
    fn predict(&self, audio: &[f32], sample_rate: u32) -> Result<EmotionPrediction> {
        (**self).predict(audio, sample_rate)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Map a speech-emotion model label onto the vocabulary.
///
/// Only the four labels the audio models share map directly; anything else
/// lands on neutral.
pub fn map_audio_label(label: &str) -> Emotion {
    match label.trim().to_ascii_lowercase().as_str() {
        "angry" => Emotion::Angry,
        "happy" => Emotion::Happy,
        "sad" => Emotion::Sad,
        _ => Emotion::Neutral,
    }
}

/// Always answers certain neutral. Used when no audio emotion model is configured.
#[derive(Debug, Clone, Default)]
pub struct NeutralAudioEmotion;

impl AudioEmotionClassifier for NeutralAudioEmotion {
    fn predict(&self, _audio: &[f32], _sample_rate: u32) -> Result<EmotionPrediction> {
        Ok(EmotionPrediction::neutral())
    }

    fn model_name(&self) -> &str {
        "neutral"
    }
}

/// Mock audio emotion classifier for testing
#[derive(Debug, Clone)]
pub struct MockAudioEmotion {
    response: EmotionPrediction,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockAudioEmotion {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAudioEmotion {
    pub fn new() -> Self {
        Self {
            response: EmotionPrediction::neutral(),
            should_fail: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_response(mut self, response: EmotionPrediction) -> Self {
        self.response = response;
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

impl AudioEmotionClassifier for MockAudioEmotion {
    fn predict(&self, _audio: &[f32], _sample_rate: u32) -> Result<EmotionPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxbridgeError::backend(
                "audio emotion",
                "mock audio emotion failure",
            ));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-audio-emotion"
    }
}
