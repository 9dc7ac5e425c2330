//! Speech-to-text backends.

pub mod transcriber;
pub mod whisper;

pub use transcriber::{
    MockTranscriber, PlaceholderTranscriber, Transcriber, TranscriptionResult,
    TranscriptionSegment,
};
