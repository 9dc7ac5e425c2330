//! Emotion Fusion Engine.
//!
//! Audio is the primary signal. Text is optional (English only) and may only
//! win or contribute when it clears its confidence threshold:
//!
//! 1. no text prediction: audio
//! 2. text below `text_min_confidence`: audio
//! 3. audio below `audio_min_confidence`: text
//! 4. otherwise: weighted average of both normalized distributions
//!
//! The branches are evaluated strictly in that order.

use crate::defaults;
use crate::emotion::{Emotion, EmotionPrediction, argmax, normalize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Thresholds and weights for [`fuse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub text_min_confidence: f64,
    pub audio_min_confidence: f64,
    pub audio_weight: f64,
    pub text_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            text_min_confidence: defaults::TEXT_MIN_CONFIDENCE,
            audio_min_confidence: defaults::AUDIO_MIN_CONFIDENCE,
            audio_weight: defaults::AUDIO_WEIGHT,
            text_weight: defaults::TEXT_WEIGHT,
        }
    }
}

/// Combine an audio prediction with an optional text prediction.
///
/// In the two gated branches the chosen input is returned unchanged, scores
/// included.
pub fn fuse(
    audio: &EmotionPrediction,
    text: Option<&EmotionPrediction>,
    config: &FusionConfig,
) -> EmotionPrediction {
    let Some(text) = text else {
        return audio.clone();
    };

    if text.confidence < config.text_min_confidence {
        return audio.clone();
    }

    if audio.confidence < config.audio_min_confidence {
        return text.clone();
    }

    let audio_scores = normalize(&audio.scores);
    let text_scores = normalize(&text.scores);

    let combined: BTreeMap<Emotion, f64> = Emotion::ALL
        .into_iter()
        .map(|e| {
            let a = audio_scores.get(&e).copied().unwrap_or(0.0);
            let t = text_scores.get(&e).copied().unwrap_or(0.0);
            (e, config.audio_weight * a + config.text_weight * t)
        })
        .collect();

    let combined = normalize(&combined);
    let (label, confidence) = argmax(&combined);

    EmotionPrediction {
        label,
        confidence,
        scores: combined,
    }
}
