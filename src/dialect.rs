//! Telugu dialect heuristic.
//!
//! Keyword-presence scoring, no model. Each non-standard dialect scores 1.0
//! per marker found anywhere in the lowercased text; standard Telugu carries
//! a constant base of 1.0 so it wins when no markers are present and the
//! total is never zero.

use serde::{Deserialize, Serialize};
use std::fmt;

const TELANGANA_MARKERS: &[&str] = &["ra", "emo", "inka enduku"];
const ANDHRA_MARKERS: &[&str] = &["ayya", "andi", "kadha"];
const STANDARD_BASE_SCORE: f64 = 1.0;
const EMPTY_INPUT_CONFIDENCE: f64 = 0.5;

/// Telugu dialect label. Variant order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Telangana,
    Andhra,
    StandardTelugu,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Telangana, Dialect::Andhra, Dialect::StandardTelugu];

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Telangana => "telangana",
            Dialect::Andhra => "andhra",
            Dialect::StandardTelugu => "standard_telugu",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DialectPrediction {
    pub dialect: Dialect,
    pub confidence: f64,
}

impl DialectPrediction {
    /// Standard Telugu at the given confidence.
    pub fn standard(confidence: f64) -> Self {
        Self {
            dialect: Dialect::StandardTelugu,
            confidence,
        }
    }
}

/// Stateless dialect detector. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialectDetector;

impl DialectDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, text: &str) -> DialectPrediction {
        if text.trim().is_empty() {
            return DialectPrediction::standard(EMPTY_INPUT_CONFIDENCE);
        }

        let lowered = text.to_lowercase();
        let hits = |markers: &[&str]| {
            markers.iter().filter(|m| lowered.contains(**m)).count() as f64
        };

        let scores = [
            (Dialect::Telangana, hits(TELANGANA_MARKERS)),
            (Dialect::Andhra, hits(ANDHRA_MARKERS)),
            (Dialect::StandardTelugu, STANDARD_BASE_SCORE),
        ];
        let total: f64 = scores.iter().map(|(_, s)| s).sum();

        let mut winner = scores[0];
        for candidate in &scores[1..] {
            if candidate.1 > winner.1 {
                winner = *candidate;
            }
        }

        DialectPrediction {
            dialect: winner.0,
            confidence: winner.1 / total,
        }
    }
}
