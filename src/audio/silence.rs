//! Silence Gate: RMS energy checks with two independently tuned thresholds.

use crate::defaults;
use serde::{Deserialize, Serialize};

/// Root-mean-square energy of `samples`; zero for empty input.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}

/// True if the energy of `samples` is below `threshold`.
///
/// Zero-length input is always silent.
pub fn is_silent(samples: &[f32], threshold: f32) -> bool {
    samples.is_empty() || calculate_rms(samples) < threshold
}

/// The two silence decisions the pipeline makes.
///
/// The transcription gate short-circuits the whole request; the emotion gate
/// only skips the audio emotion classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceGate {
    /// Below this the audio cannot be transcribed reliably.
    pub transcription_threshold: f32,
    /// Below this the audio is treated as emotionally neutral.
    pub emotion_threshold: f32,
}

impl Default for SilenceGate {
    fn default() -> Self {
        Self {
            transcription_threshold: defaults::TRANSCRIPTION_SILENCE_THRESHOLD,
            emotion_threshold: defaults::EMOTION_SILENCE_THRESHOLD,
        }
    }
}

impl SilenceGate {
    pub fn new(transcription_threshold: f32, emotion_threshold: f32) -> Self {
        Self {
            transcription_threshold,
            emotion_threshold,
        }
    }

    /// Strict check run before transcription.
    pub fn is_untranscribable(&self, samples: &[f32]) -> bool {
        is_silent(samples, self.transcription_threshold)
    }

    /// Looser check run before audio emotion classification.
    pub fn is_emotionally_neutral(&self, samples: &[f32]) -> bool {
        is_silent(samples, self.emotion_threshold)
    }
}
