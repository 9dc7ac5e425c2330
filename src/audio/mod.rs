//! Audio handling: decoding, normalization, resampling and silence gating.
//!
//! Every stage downstream of [`normalize::normalize_audio`] receives a mono
//! [`Waveform`] at [`crate::defaults::SAMPLE_RATE`].

pub mod codec;
pub mod normalize;
pub mod resample;
pub mod silence;

pub use normalize::normalize_audio;
pub use silence::SilenceGate;

/// Mono floating-point samples in [-1.0, 1.0] tagged with their sample rate.
///
/// Stages never mutate a waveform they were handed; a transform returns a
/// new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A zero-length waveform.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
