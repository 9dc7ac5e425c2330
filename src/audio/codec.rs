//! Audio container decoding (WAV, FLAC, OGG/Vorbis) and WAV encoding.

use crate::audio::Waveform;
use crate::defaults::MAX_INPUT_SAMPLE_RATE;
use crate::error::{Result, VoxbridgeError};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Interleaved samples exactly as stored in the container, scaled to [-1, 1].
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub interleaved: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Decode any supported container of any channel count and encoding.
///
/// The container is sniffed from the bytes; no file name is needed.
///
/// # Errors
/// `VoxbridgeError::InvalidAudio` for unrecognized or corrupt input, and for
/// sample rates of zero or above [`MAX_INPUT_SAMPLE_RATE`].
pub fn decode_audio(bytes: &[u8]) -> Result<DecodedAudio> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let sniffed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VoxbridgeError::InvalidAudio {
            message: format!("Invalid or unsupported audio format: {}", e),
        })?;
    let mut format = sniffed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| VoxbridgeError::InvalidAudio {
            message: "Invalid or unsupported audio format: no audio track".to_string(),
        })?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
    let mut sample_rate = params.sample_rate.unwrap_or(0);
    if let Some(rate) = params.sample_rate {
        check_sample_rate(rate)?;
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| VoxbridgeError::InvalidAudio {
            message: format!("Invalid or unsupported audio format: {}", e),
        })?;

    let mut interleaved = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(read_error(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::debug!(reason, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(read_error(e)),
        };

        let spec = *decoded.spec();
        if channels == 0 {
            channels = spec.channels.count() as u16;
        }
        if sample_rate == 0 {
            check_sample_rate(spec.rate)?;
            sample_rate = spec.rate;
        }

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buffer.samples());
    }

    if channels == 0 {
        return Err(VoxbridgeError::InvalidAudio {
            message: "Audio stream declares zero channels".to_string(),
        });
    }
    check_sample_rate(sample_rate)?;

    Ok(DecodedAudio {
        interleaved,
        channels,
        sample_rate,
    })
}

fn check_sample_rate(rate: u32) -> Result<()> {
    if rate == 0 {
        return Err(VoxbridgeError::InvalidAudio {
            message: "Audio stream declares a zero sample rate".to_string(),
        });
    }
    if rate > MAX_INPUT_SAMPLE_RATE {
        return Err(VoxbridgeError::InvalidAudio {
            message: format!(
                "Sample rate {}Hz exceeds the supported maximum of {}Hz",
                rate, MAX_INPUT_SAMPLE_RATE
            ),
        });
    }
    Ok(())
}

fn read_error(e: SymphoniaError) -> VoxbridgeError {
    VoxbridgeError::InvalidAudio {
        message: format!("Failed to read audio samples: {}", e),
    }
}

/// Encode a mono waveform as 16-bit PCM WAV bytes.
pub fn encode_wav(wave: &Waveform) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: wave.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(write_error)?;
    for &sample in wave.samples() {
        let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(pcm).map_err(write_error)?;
    }
    writer.finalize().map_err(write_error)?;

    Ok(cursor.into_inner())
}

fn write_error(e: hound::Error) -> VoxbridgeError {
    VoxbridgeError::backend("audio encoder", format!("Failed to write WAV: {}", e))
}
