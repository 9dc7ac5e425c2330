//! Tone generator tier.
//!
//! A placeholder voice: a sine whose pitch is derived from a hash of the
//! text and whose length grows with the text. Deterministic so tests can
//! rely on it; the exact pitch mapping carries no meaning.

use crate::audio::Waveform;
use crate::defaults::TONE_SAMPLE_RATE;
use crate::emotion::Emotion;
use crate::error::Result;
use crate::language::Language;
use crate::tts::VoiceEngine;

const BASE_FREQ_HZ: f32 = 220.0;
const FREQ_SPAN_HZ: u64 = 440;
const SECS_PER_CHAR: f32 = 0.06;
const MIN_SECS: f32 = 0.5;
const MAX_SECS: f32 = 10.0;
const AMPLITUDE: f32 = 0.3;
const FADE_SECS: f32 = 0.01;

/// 64-bit FNV-1a.
fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[derive(Debug, Clone)]
pub struct ToneEngine {
    sample_rate: u32,
}

impl Default for ToneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: TONE_SAMPLE_RATE,
        }
    }

    pub fn frequency_for(text: &str) -> f32 {
        BASE_FREQ_HZ + (fnv1a(text) % FREQ_SPAN_HZ) as f32
    }
}

impl VoiceEngine for ToneEngine {
    fn synthesize(&self, text: &str, _language: Language, _emotion: Emotion) -> Result<Waveform> {
        let freq = Self::frequency_for(text);
        let secs = (text.chars().count() as f32 * SECS_PER_CHAR).clamp(MIN_SECS, MAX_SECS);
        let rate = self.sample_rate as f32;
        let n = (secs * rate) as usize;
        let fade = ((FADE_SECS * rate) as usize).max(1);

        let samples = (0..n)
            .map(|i| {
                let envelope = (i.min(n - 1 - i) as f32 / fade as f32).min(1.0);
                AMPLITUDE * envelope * (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin()
            })
            .collect();

        Ok(Waveform::new(samples, self.sample_rate))
    }

    fn name(&self) -> &str {
        "tone"
    }
}
