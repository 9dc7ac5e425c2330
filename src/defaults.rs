//! Default configuration constants for voxbridge.
//!
//! Shared by the config layer, the orchestrator and the adapters so that a
//! value tuned in one place is the value used everywhere.

/// Canonical sample rate in Hz for every analysis stage.
///
/// Transcription and emotion models are trained on 16kHz mono audio, so the
/// normalizer resamples everything to this rate before any stage sees it.
pub const SAMPLE_RATE: u32 = 16000;

/// Highest input sample rate accepted by the decoder (384 kHz studio audio).
pub const MAX_INPUT_SAMPLE_RATE: u32 = 384_000;

/// Strict RMS threshold: below this the audio cannot be transcribed reliably.
///
/// Deliberately tiny so quiet recordings still reach the transcriber; only
/// digital silence and near-silence trip it.
pub const TRANSCRIPTION_SILENCE_THRESHOLD: f32 = 1e-5;

/// Looser RMS threshold: below this the audio is treated as emotionally neutral.
pub const EMOTION_SILENCE_THRESHOLD: f32 = 1e-4;

/// Text predictions under this confidence never influence the fused emotion.
pub const TEXT_MIN_CONFIDENCE: f64 = 0.40;

/// Audio predictions under this confidence yield to a confident text prediction.
pub const AUDIO_MIN_CONFIDENCE: f64 = 0.40;

/// Weight of the audio distribution in the fused average.
pub const AUDIO_WEIGHT: f64 = 0.65;

/// Weight of the text distribution in the fused average.
pub const TEXT_WEIGHT: f64 = 0.35;

/// Timeout for the joint transcription + audio emotion phase.
pub const STT_EMOTION_TIMEOUT_MS: u64 = 30_000;

/// Timeout for the optional text emotion phase.
pub const TEXT_EMOTION_TIMEOUT_MS: u64 = 10_000;

/// Timeout for the translation phase.
pub const TRANSLATION_TIMEOUT_MS: u64 = 30_000;

/// Timeout for the synthesis phase.
pub const SYNTHESIS_TIMEOUT_MS: u64 = 30_000;

/// Outer deadline for a whole pipeline run.
pub const TOTAL_TIMEOUT_MS: u64 = 120_000;

/// Language assumed when detection yields nothing usable.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Directory (relative to the working directory) for synthesized artifacts.
pub const OUTPUTS_DIR: &str = "outputs";

/// Sample rate of the tone generator tier.
pub const TONE_SAMPLE_RATE: u32 = 22050;

/// Sample rate assumed for raw PCM produced by the neural voice tier.
pub const NEURAL_SAMPLE_RATE: u32 = 22050;

/// OS voice command used by the system tier (must write WAV to stdout).
pub const SYSTEM_VOICE_COMMAND: &str = "espeak-ng";

/// Placeholder transcript produced when no transcription model is configured.
pub const PLACEHOLDER_TRANSCRIPT: &str = "Test transcription";
