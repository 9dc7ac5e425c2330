//! External model backends run as subprocesses.

pub mod command;
pub mod process;

pub use command::{CommandRunner, SystemCommandRunner};
pub use process::{
    ModelCommand, ProcessAudioEmotion, ProcessTextEmotion, ProcessTranscriber, ProcessTranslator,
};
