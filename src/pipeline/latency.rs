//! Per-phase latency bookkeeping for a single run.

use crate::error::Phase;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Wall-clock time spent in each phase, in milliseconds.
///
/// A phase that did not run (short-circuit, skipped enhancement) stays `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub normalize_ms: Option<u64>,
    pub stt_emotion_ms: Option<u64>,
    pub text_emotion_ms: Option<u64>,
    pub translation_ms: Option<u64>,
    pub synthesis_ms: Option<u64>,
}

impl PhaseTimings {
    pub fn record(&mut self, phase: Phase, elapsed: Duration) {
        let ms = Some(elapsed.as_millis() as u64);
        match phase {
            Phase::SttEmotion => self.stt_emotion_ms = ms,
            Phase::TextEmotion => self.text_emotion_ms = ms,
            Phase::Translation => self.translation_ms = ms,
            Phase::Synthesis => self.synthesis_ms = ms,
        }
    }

    pub fn get(&self, phase: Phase) -> Option<u64> {
        match phase {
            Phase::SttEmotion => self.stt_emotion_ms,
            Phase::TextEmotion => self.text_emotion_ms,
            Phase::Translation => self.translation_ms,
            Phase::Synthesis => self.synthesis_ms,
        }
    }

    /// Sum of all recorded phases.
    pub fn recorded_total_ms(&self) -> u64 {
        [
            self.normalize_ms,
            self.stt_emotion_ms,
            self.text_emotion_ms,
            self.translation_ms,
            self.synthesis_ms,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

/// Measures one phase; call [`PhaseClock::stop`] once it ends.
#[derive(Debug, Clone, Copy)]
pub struct PhaseClock {
    phase: Phase,
    started: Instant,
}

impl PhaseClock {
    pub fn start(phase: Phase) -> Self {
        Self {
            phase,
            started: Instant::now(),
        }
    }

    pub fn stop(self, timings: &mut PhaseTimings) -> Duration {
        let elapsed = self.started.elapsed();
        timings.record(self.phase, elapsed);
        tracing::debug!(phase = %self.phase, elapsed_ms = elapsed.as_millis() as u64, "Phase finished");
        elapsed
    }
}

/// Real-time factor: processing time over audio duration.
///
/// Below 1.0 means faster than real time. Zero for empty audio.
pub fn realtime_factor(processing: Duration, audio_secs: f64) -> f64 {
    if audio_secs <= 0.0 {
        return 0.0;
    }
    processing.as_secs_f64() / audio_secs
}
