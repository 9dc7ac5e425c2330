//! Audio Normalizer: raw bytes in, canonical 16kHz mono waveform out.

use crate::audio::Waveform;
use crate::audio::resample::resample_poly;
use crate::audio::codec::decode_audio;
use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, VoxbridgeError};

/// Decode `bytes` and convert to mono float samples at [`SAMPLE_RATE`].
///
/// Multi-channel audio is averaged (not channel-dropped), resampled with an
/// exact rational ratio, and hard-clipped to [-1.0, 1.0] to guard against
/// decoder overshoot.
///
/// # Errors
/// Returns `VoxbridgeError::InvalidAudio` if the bytes cannot be decoded,
/// the sample rate is out of range, or the decoded stream holds no samples.
pub fn normalize_audio(bytes: &[u8]) -> Result<Waveform> {
    normalize_audio_to(bytes, SAMPLE_RATE)
}

/// Same as [`normalize_audio`] with an explicit target rate.
pub fn normalize_audio_to(bytes: &[u8], target_rate: u32) -> Result<Waveform> {
    let decoded = decode_audio(bytes)?;
    if decoded.interleaved.is_empty() {
        return Err(VoxbridgeError::InvalidAudio {
            message: "Decoded audio is empty.".to_string(),
        });
    }

    let mono = downmix(&decoded.interleaved, decoded.channels);
    let resampled = resample_poly(&mono, decoded.sample_rate, target_rate);
    let clipped = resampled.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect();

    Ok(Waveform::new(clipped, target_rate))
}

/// Arithmetic mean across channels of interleaved frames.
///
/// A trailing partial frame is dropped.
pub fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::codec::test_support::{make_wav_f32, make_wav_i16};

    #[test]
    fn mono_16k_passes_through_scaled() {
        let wav = make_wav_i16(16000, 1, &[0, 16384, -16384]);
        let wave = normalize_audio(&wav).unwrap();

        assert_eq!(wave.sample_rate(), 16000);
        assert_eq!(wave.samples(), &[0.0, 0.5, -0.5]);
    }

    #[test]
    fn stereo_is_averaged_not_dropped() {
        // Left carries signal, right is silent: a channel drop would keep 0.5
        let wav = make_wav_f32(16000, 2, &[0.5, 0.0, -0.5, 0.0]);
        let wave = normalize_audio(&wav).unwrap();

        assert_eq!(wave.samples(), &[0.25, -0.25]);
    }

    #[test]
    fn downmix_handles_more_than_two_channels() {
        let mono = downmix(&[0.3, 0.3, 0.3, 0.6, 0.0, 0.0], 3);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn downmix_drops_partial_frame() {
        assert_eq!(downmix(&[0.2, 0.4, 0.9], 2), vec![0.3]);
    }

    #[test]
    fn resamples_48k_to_16k() {
        let wav = make_wav_i16(48000, 1, &vec![0i16; 48000]);
        let wave = normalize_audio(&wav).unwrap();

        assert_eq!(wave.sample_rate(), 16000);
        assert_eq!(wave.len(), 16000);
    }

    #[test]
    fn output_is_clipped_to_unit_range() {
        let wav = make_wav_f32(16000, 1, &[1.7, -3.0, 0.2]);
        let wave = normalize_audio(&wav).unwrap();

        assert_eq!(wave.samples(), &[1.0, -1.0, 0.2]);
    }

    #[test]
    fn empty_data_chunk_is_invalid_audio() {
        let wav = make_wav_i16(16000, 1, &[]);
        let err = normalize_audio(&wav).unwrap_err();
        assert!(matches!(err, VoxbridgeError::InvalidAudio { .. }));
    }

    #[test]
    fn absurd_sample_rate_is_invalid_audio() {
        let wav = make_wav_i16(1_000_000, 1, &[0, 8000, -8000, 0]);
        let err = normalize_audio(&wav).unwrap_err();
        assert!(matches!(err, VoxbridgeError::InvalidAudio { .. }));
    }

    #[test]
    fn undecodable_bytes_are_invalid_audio() {
        let err = normalize_audio(b"definitely not audio").unwrap_err();
        assert!(matches!(err, VoxbridgeError::InvalidAudio { .. }));
    }
}
