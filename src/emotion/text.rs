//! Text emotion classification (English transcripts only).

use crate::emotion::{Emotion, EmotionPrediction};
use crate::error::{Result, VoxbridgeError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Predicts an emotion from transcript text.
///
/// Implementations must reject empty or whitespace-only text with
/// `VoxbridgeError::InvalidInput`.
pub trait TextEmotionClassifier: Send + Sync {
    fn predict(&self, text: &str) -> Result<EmotionPrediction>;

    fn model_name(&self) -> &str;
}

impl<T: TextEmotionClassifier + ?Sized> TextEmotionClassifier for Arc<T> {
    fn predict(&self, text: &str) -> Result<EmotionPrediction> {
        (**self).predict(text)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Map a text-emotion model label onto the vocabulary.
///
/// Ekman names and the vocabulary's own names are both accepted.
/// `disgust`, `surprise` and anything unrecognized become neutral.
pub fn map_text_label(label: &str) -> Emotion {
    match label.trim().to_ascii_lowercase().as_str() {
        "anger" | "angry" => Emotion::Angry,
        "fear" | "fearful" => Emotion::Fearful,
        "joy" | "happy" => Emotion::Happy,
        "sadness" | "sad" => Emotion::Sad,
        _ => Emotion::Neutral,
    }
}

pub(crate) fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(VoxbridgeError::invalid_input(
            "Text for emotion detection must not be empty.",
        ));
    }
    Ok(())
}

/// Mock text emotion classifier for testing
#[derive(Debug, Clone)]
pub struct MockTextEmotion {
    response: EmotionPrediction,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockTextEmotion {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTextEmotion {
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

impl TextEmotionClassifier for MockTextEmotion {
    fn predict(&self, text: &str) -> Result<EmotionPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ensure_text(text)?;
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxbridgeError::backend(
                "text emotion",
                "mock text emotion failure",
            ));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-text-emotion"
    }
}
