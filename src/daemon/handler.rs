//! Command handler implementation for the daemon.

use crate::error::{Result, VoxbridgeError};
use crate::ipc::protocol::{Command, Response};
use crate::ipc::server::{CommandHandler, ShutdownSignal};
use crate::language::Language;
use crate::pipeline::Pipeline;
use crate::pipeline::orchestrator::blocking;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Command handler for daemon IPC commands.
pub struct DaemonCommandHandler {
    pipeline: Arc<Pipeline>,
    shutdown: ShutdownSignal,
}

/// Read an input audio file named by the client.
async fn read_audio(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VoxbridgeError::invalid_input(format!("Audio file not found: {}", path.display()))
        } else {
            VoxbridgeError::Io(e)
        }
    })
}

impl DaemonCommandHandler {
    pub fn new(pipeline: Arc<Pipeline>, shutdown: ShutdownSignal) -> Self {
        Self { pipeline, shutdown }
    }

    async fn dispatch(&self, command: Command) -> Result<Response> {
        match command {
            Command::TranslateSpeech {
                audio_path,
                target_lang,
            } => {
                let target = Language::parse(&target_lang)?;
                let audio = read_audio(&audio_path).await?;
                let result = self.pipeline.run(audio, target).await?;
                Ok(Response::Pipeline { result })
            }
            Command::Transcribe { audio_path } => {
                let audio = read_audio(&audio_path).await?;
                let result = self.pipeline.transcribe(audio).await?;
                Ok(Response::Transcription { result })
            }
            Command::DetectEmotion { audio_path } => {
                let audio = read_audio(&audio_path).await?;
                let prediction = self.pipeline.detect_emotion(audio).await?;
                Ok(Response::Emotion { prediction })
            }
            Command::DetectDialect { text } => Ok(Response::Dialect {
                prediction: self.pipeline.detect_dialect(&text),
            }),
            Command::TranslateText {
                text,
                source_lang,
                target_lang,
            } => {
                let result = self
                    .pipeline
                    .translate_text(&text, &source_lang, &target_lang)
                    .await?;
                Ok(Response::Translation { result })
            }
            Command::Synthesize {
                text,
                language,
                emotion,
                output,
            } => {
                let speech = self.pipeline.synthesize(&text, &language, &emotion).await?;
                let bytes = speech.len() as u64;
                let path = match output {
                    Some(path) => {
                        tokio::fs::write(&path, &speech).await?;
                        path
                    }
                    None => {
                        let store = self.pipeline.store().clone();
                        blocking("output", move || store.write(Uuid::new_v4(), &speech)).await?
                    }
                };
                Ok(Response::Audio { path, bytes })
            }
            Command::Health => Ok(Response::Health {
                report: self.pipeline.health(),
            }),
            Command::FetchOutput { session_id } => Ok(Response::Output {
                path: self.pipeline.fetch_output(&session_id)?,
            }),
            Command::Shutdown => {
                tracing::info!("Shutdown requested over IPC");
                self.shutdown.request().await;
                Ok(Response::Ok)
            }
        }
    }
}

#[async_trait::async_trait]
impl CommandHandler for DaemonCommandHandler {
    async fn handle(&self, command: Command) -> Response {
        match self.dispatch(command).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "Command failed");
                Response::from(e)
            }
        }
    }
}
