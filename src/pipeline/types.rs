//! Data types produced by the orchestrator.

use crate::dialect::Dialect;
use crate::emotion::Emotion;
use crate::error::VoxbridgeError;
use crate::language::Language;
use crate::pipeline::latency::PhaseTimings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Outcome of one end-to-end run.
///
/// Handed to the caller whole; a run that fails returns an error instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub session_id: Uuid,
    pub transcript: String,
    pub detected_language: Language,
    pub target_language: Language,
    pub detected_emotion: Emotion,
    pub emotion_confidence: f64,
    pub detected_dialect: Dialect,
    pub translated_text: String,
    /// `<outputs_dir>/<session_id>.wav`; zero bytes when no audio was produced.
    pub audio_path: PathBuf,
    /// Duration of the normalized input.
    pub audio_duration_secs: f64,
    pub latency_ms: u64,
    pub timings: PhaseTimings,
}

/// Result of an enhancement phase whose failure must not fail the run.
///
/// The orchestrator matches on every variant so the swallowed cases stay
/// explicit.
#[derive(Debug)]
pub enum Enhancement<T> {
    Produced(T),
    TimedOut,
    Failed(VoxbridgeError),
}

impl<T> Enhancement<T> {
    pub fn produced(self) -> Option<T> {
        match self {
            Enhancement::Produced(value) => Some(value),
            Enhancement::TimedOut | Enhancement::Failed(_) => None,
        }
    }
}
