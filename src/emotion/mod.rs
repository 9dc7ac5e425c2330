//! Emotion vocabulary, predictions, classifier adapters and fusion.

pub mod audio;
pub mod fusion;
pub mod text;

pub use audio::{AudioEmotionClassifier, MockAudioEmotion};
pub use fusion::{FusionConfig, fuse};
pub use text::{MockTextEmotion, TextEmotionClassifier};

use crate::error::{Result, VoxbridgeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The canonical five-label emotion vocabulary.
///
/// Variant order is the tie-break order for arg-max.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
        }
    }

    /// Speaking-rate multiplier applied to synthesized speech.
    ///
    /// Above 1.0 speeds delivery up (shorter audio).
    pub fn speed_factor(self) -> f64 {
        match self {
            Emotion::Happy => 1.05,
            Emotion::Sad => 0.92,
            Emotion::Angry => 1.10,
            Emotion::Neutral => 1.00,
            Emotion::Fearful => 0.95,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = VoxbridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == lower)
            .ok_or_else(|| {
                VoxbridgeError::invalid_input(format!(
                    "Unknown emotion '{}'. Expected one of: neutral, happy, sad, angry, fearful.",
                    s
                ))
            })
    }
}

/// A label, its confidence, and the full distribution it was drawn from.
///
/// `scores` always carries all five labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    pub label: Emotion,
    pub confidence: f64,
    pub scores: BTreeMap<Emotion, f64>,
}

impl EmotionPrediction {
    /// Certain neutral: confidence 1.0, all other labels 0.0.
    pub fn neutral() -> Self {
        Self::certain(Emotion::Neutral)
    }

    /// Full confidence in `label`.
    pub fn certain(label: Emotion) -> Self {
        let scores = Emotion::ALL
            .into_iter()
            .map(|e| (e, if e == label { 1.0 } else { 0.0 }))
            .collect();
        Self {
            label,
            confidence: 1.0,
            scores,
        }
    }

    /// Normalize `scores` and pick the arg-max.
    ///
    /// Missing labels count as zero and negative or non-finite scores are
    /// clamped to zero. An all-zero distribution becomes certain neutral.
    pub fn from_scores(scores: &BTreeMap<Emotion, f64>) -> Self {
        let distribution = normalize(scores);
        if distribution.values().all(|&v| v == 0.0) {
            return Self::neutral();
        }
        let (label, confidence) = argmax(&distribution);
        Self {
            label,
            confidence,
            scores: distribution,
        }
    }

    /// Aggregate raw backend `(label, probability)` pairs into the canonical
    /// vocabulary via `map_label`, summing labels that collapse together.
    pub fn from_raw_labels<'a, I, F>(raw: I, map_label: F) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
        F: Fn(&str) -> Emotion,
    {
        let mut scores: BTreeMap<Emotion, f64> = BTreeMap::new();
        for (label, probability) in raw {
            *scores.entry(map_label(label)).or_insert(0.0) += probability;
        }
        Self::from_scores(&scores)
    }

    /// Score for `emotion`, zero if absent.
    pub fn score(&self, emotion: Emotion) -> f64 {
        self.scores.get(&emotion).copied().unwrap_or(0.0)
    }
}

/// Distribution over all five labels summing to 1.0 (or all zero).
pub(crate) fn normalize(scores: &BTreeMap<Emotion, f64>) -> BTreeMap<Emotion, f64> {
    let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    let total: f64 = Emotion::ALL
        .into_iter()
        .map(|e| clean(scores.get(&e).copied().unwrap_or(0.0)))
        .sum();

    Emotion::ALL
        .into_iter()
        .map(|e| {
            let v = clean(scores.get(&e).copied().unwrap_or(0.0));
            (e, if total > 0.0 { v / total } else { 0.0 })
        })
        .collect()
}

/// Highest-scoring label; the first in vocabulary order wins ties.
pub(crate) fn argmax(scores: &BTreeMap<Emotion, f64>) -> (Emotion, f64) {
    let mut best = (Emotion::Neutral, f64::NEG_INFINITY);
    for emotion in Emotion::ALL {
        let score = scores.get(&emotion).copied().unwrap_or(0.0);
        if score > best.1 {
            best = (emotion, score);
        }
    }
    best
}
