//! Neural voice tier: an external TTS command (piper-style) that reads text
//! on stdin and writes raw signed 16-bit little-endian mono PCM to stdout.
//!
//! Arguments may contain `{lang}` and `{emotion}`, substituted per request.

use crate::audio::Waveform;
use crate::backend::CommandRunner;
use crate::backend::command::expand_args;
use crate::emotion::Emotion;
use crate::error::{Result, VoxbridgeError};
use crate::language::Language;
use crate::tts::VoiceEngine;
use std::sync::Arc;
use std::time::Duration;

pub struct NeuralVoiceEngine {
    runner: Arc<dyn CommandRunner>,
    argv: Vec<String>,
    sample_rate: u32,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for NeuralVoiceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuralVoiceEngine")
            .field("argv", &self.argv)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Decode raw s16le PCM. A trailing odd byte is ignored.
pub fn pcm_s16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

impl NeuralVoiceEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, argv: Vec<String>, sample_rate: u32) -> Self {
        Self {
            runner,
            argv,
            sample_rate,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl VoiceEngine for NeuralVoiceEngine {
    fn synthesize(&self, text: &str, language: Language, emotion: Emotion) -> Result<Waveform> {
        let argv = expand_args(
            &self.argv,
            &[("lang", language.code()), ("emotion", emotion.as_str())],
        );
        let stdout = self.runner.run("synthesis", &argv, text.as_bytes(), self.timeout)?;
        if stdout.len() < 2 {
            return Err(VoxbridgeError::backend(
                "synthesis",
                "neural voice command produced no audio",
            ));
        }
        Ok(Waveform::new(pcm_s16le_to_f32(&stdout), self.sample_rate))
    }

    fn name(&self) -> &str {
        "neural"
    }
}
