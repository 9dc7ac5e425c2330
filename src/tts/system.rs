//! OS voice tier (espeak-ng compatible command writing WAV to stdout).

use crate::audio::Waveform;
use crate::audio::normalize::downmix;
use crate::audio::codec::decode_audio;
use crate::backend::CommandRunner;
use crate::emotion::Emotion;
use crate::error::{Result, VoxbridgeError};
use crate::language::Language;
use crate::tts::VoiceEngine;
use std::sync::Arc;
use std::time::Duration;

pub struct SystemVoiceEngine {
    runner: Arc<dyn CommandRunner>,
    program: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for SystemVoiceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemVoiceEngine")
            .field("program", &self.program)
            .finish()
    }
}

impl SystemVoiceEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, program: String) -> Self {
        Self {
            runner,
            program,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn argv(&self, text: &str, language: Language) -> Vec<String> {
        vec![
            self.program.clone(),
            "-v".to_string(),
            language.code().to_string(),
            "--stdout".to_string(),
            text.to_string(),
        ]
    }
}

impl VoiceEngine for SystemVoiceEngine {
    fn synthesize(&self, text: &str, language: Language, _emotion: Emotion) -> Result<Waveform> {
        let stdout = self.runner
            .run("synthesis", &self.argv(text, language), &[], self.timeout)?;
        let decoded = decode_audio(&stdout).map_err(|e| {
            VoxbridgeError::backend("synthesis", format!("{} wrote unreadable audio: {}", self.program, e))
        })?;
        Ok(Waveform::new(
            downmix(&decoded.interleaved, decoded.channels),
            decoded.sample_rate,
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}
