//! Loaded model adapters shared by every request.
//!
//! Built once at startup and handed to the [`Pipeline`](super::Pipeline) by
//! value; there is no global registry. Missing optional adapters are `None`
//! and the orchestrator takes the documented fallback path.

use crate::backend::{
    CommandRunner, ModelCommand, ProcessAudioEmotion, ProcessTextEmotion, ProcessTranscriber,
    ProcessTranslator,
};
use crate::config::Config;
use crate::dialect::DialectDetector;
use crate::emotion::audio::NeutralAudioEmotion;
use crate::emotion::{AudioEmotionClassifier, TextEmotionClassifier};
use crate::error::{Result, VoxbridgeError};
use crate::stt::whisper::{WhisperConfig, WhisperTranscriber};
use crate::stt::{PlaceholderTranscriber, Transcriber};
use crate::translate::{PassthroughTranslator, TranslationService, Translator};
use crate::tts::Synthesizer;
use std::sync::Arc;
use std::time::Duration;

/// Builds a synthesizer on demand when none was loaded at startup.
pub type SynthesizerFactory = Arc<dyn Fn() -> Result<Synthesizer> + Send + Sync>;

#[derive(Clone)]
pub struct ServiceContext {
    pub transcriber: Arc<dyn Transcriber>,
    pub audio_emotion: Arc<dyn AudioEmotionClassifier>,
    pub text_emotion: Option<Arc<dyn TextEmotionClassifier>>,
    pub dialect: DialectDetector,
    pub translator: TranslationService,
    pub synthesizer: Option<Arc<Synthesizer>>,
    pub fallback_synthesizer: SynthesizerFactory,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("transcriber", &self.transcriber.model_name())
            .field("audio_emotion", &self.audio_emotion.model_name())
            .field(
                "text_emotion",
                &self.text_emotion.as_ref().map(|t| t.model_name().to_string()),
            )
            .field("translator", &self.translator.model_name())
            .field("synthesizer", &self.synthesizer)
            .finish()
    }
}

impl ServiceContext {
    /// Context with only the two required adapters; everything optional is
    /// absent and translation passes text through.
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        audio_emotion: Arc<dyn AudioEmotionClassifier>,
    ) -> Self {
        Self {
            transcriber,
            audio_emotion,
            text_emotion: None,
            dialect: DialectDetector::new(),
            translator: TranslationService::new(Arc::new(PassthroughTranslator)),
            synthesizer: None,
            fallback_synthesizer: Arc::new(|| Ok(Synthesizer::tone_only())),
        }
    }

    pub fn with_text_emotion(mut self, classifier: Arc<dyn TextEmotionClassifier>) -> Self {
        self.text_emotion = Some(classifier);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = TranslationService::new(translator);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = Some(Arc::new(synthesizer));
        self
    }

    pub fn with_fallback_synthesizer(mut self, factory: SynthesizerFactory) -> Self {
        self.fallback_synthesizer = factory;
        self
    }

    /// Load adapters as configured.
    ///
    /// A configured command wins over a built-in backend. Without either,
    /// transcription uses the placeholder and a warning is logged. Every
    /// command is killed once it outlives the timeout of its phase.
    ///
    /// # Errors
    /// Fails only when a configured Whisper model cannot be loaded.
    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let models = &config.models;
        let limits = &config.pipeline;
        let command = |argv: &Vec<String>, timeout_ms: u64| {
            ModelCommand::new(runner.clone(), argv.clone())
                .with_timeout(Duration::from_millis(timeout_ms))
        };

        let transcriber: Arc<dyn Transcriber> = match (&models.stt.command, &models.stt.whisper_model)
        {
            (Some(argv), _) => Arc::new(ProcessTranscriber::new(command(
                argv,
                limits.stt_emotion_timeout_ms,
            ))),
            (None, Some(model_path)) => Arc::new(WhisperTranscriber::new(WhisperConfig {
                model_path: model_path.clone(),
                threads: models.stt.threads,
            })?),
            (None, None) => {
                tracing::warn!("No transcription model configured, using placeholder transcriber");
                Arc::new(PlaceholderTranscriber)
            }
        };

        let audio_emotion: Arc<dyn AudioEmotionClassifier> = match &models.audio_emotion.command {
            Some(argv) => Arc::new(ProcessAudioEmotion::new(command(
                argv,
                limits.stt_emotion_timeout_ms,
            ))),
            None => Arc::new(NeutralAudioEmotion),
        };

        let mut context = Self::new(transcriber, audio_emotion);

        if let Some(argv) = &models.text_emotion.command {
            context = context.with_text_emotion(Arc::new(ProcessTextEmotion::new(command(
                argv,
                limits.text_emotion_timeout_ms,
            ))));
        }

        if let Some(argv) = &models.translation.command {
            context = context.with_translator(Arc::new(ProcessTranslator::new(command(
                argv,
                limits.translation_timeout_ms,
            ))));
        }

        let synthesis_timeout = Some(Duration::from_millis(limits.synthesis_timeout_ms));
        if config.synthesis.enabled {
            context = context.with_synthesizer(Synthesizer::from_config(
                &config.synthesis,
                runner.clone(),
                synthesis_timeout,
            ));
            // A later rebuild uses the same tiers
            let synthesis = config.synthesis.clone();
            let runner = runner.clone();
            context = context.with_fallback_synthesizer(Arc::new(move || {
                Ok(Synthesizer::from_config(&synthesis, runner.clone(), synthesis_timeout))
            }));
        } else {
            tracing::info!("Synthesis disabled, runs will write empty audio");
            context = context.with_fallback_synthesizer(Arc::new(|| {
                Err(VoxbridgeError::BackendUnavailable {
                    stage: "synthesis".to_string(),
                    message: "synthesis disabled".to_string(),
                })
            }));
        }

        tracing::debug!(context = ?context, "Loaded service context");
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::codec::test_support::make_wav_f32;
    use crate::backend::SystemCommandRunner;
    use crate::backend::command::test_support::MockCommandRunner;
    use crate::tts::VoiceTier;
    use crate::language::Language;
    use crate::pipeline::{Pipeline, PipelineSettings};
    use crate::emotion::MockAudioEmotion;
    use crate::stt::MockTranscriber;

    fn runner() -> Arc<dyn CommandRunner> {
        Arc::new(SystemCommandRunner::new())
    }

    #[test]
    fn default_config_uses_builtin_fallbacks() {
        let context = ServiceContext::from_config(&Config::default(), runner()).unwrap();

        assert_eq!(context.transcriber.model_name(), "placeholder");
        assert!(context.text_emotion.is_none());
        assert_eq!(context.translator.model_name(), "passthrough");
        assert!(context.synthesizer.is_some());
    }

    #[test]
    fn configured_commands_select_process_adapters() {
        let mut config = Config::default();
        config.models.stt.command = Some(vec!["/opt/models/stt".to_string()]);
        config.models.text_emotion.command = Some(vec!["text-emo".to_string()]);
        config.models.translation.command = Some(vec!["nllb".to_string(), "--fast".to_string()]);

        let context = ServiceContext::from_config(&config, runner()).unwrap();

        assert_eq!(context.transcriber.model_name(), "stt");
        assert_eq!(
            context.text_emotion.as_ref().map(|t| t.model_name()),
            Some("text-emo")
        );
        assert_eq!(context.translator.model_name(), "nllb");
    }

    #[test]
    fn disabled_synthesis_leaves_no_synthesizer() {
        let mut config = Config::default();
        config.synthesis.enabled = false;

        let context = ServiceContext::from_config(&config, runner()).unwrap();
        assert!(context.synthesizer.is_none());
        let err = (context.fallback_synthesizer)().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unavailable);
    }

    #[test]
    fn fallback_rebuilds_configured_tiers() {
        let mut config = Config::default();
        config.synthesis.tiers = vec![VoiceTier::System, VoiceTier::Tone];

        let context = ServiceContext::from_config(&config, runner()).unwrap();
        let rebuilt = (context.fallback_synthesizer)().unwrap();
        assert_eq!(rebuilt.engine_names(), vec!["system", "tone"]);
    }

    #[tokio::test]
    async fn disabled_synthesis_writes_empty_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.synthesis.enabled = false;
        config.pipeline.outputs_dir = dir.path().to_path_buf();

        let mut context = ServiceContext::from_config(&config, runner()).unwrap();
        context.transcriber = Arc::new(MockTranscriber::new("mock").with_response("hello"));
        context.audio_emotion = Arc::new(MockAudioEmotion::new());
        let pipeline = Pipeline::new(context, PipelineSettings::from(&config));

        let tone: Vec<f32> = (0..8000)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
            .collect();
        let audio = make_wav_f32(16000, 1, &tone);
        let result = pipeline.run(audio, Language::Hi).await.unwrap();

        assert_eq!(result.translated_text, "hello");
        assert_eq!(std::fs::metadata(&result.audio_path).unwrap().len(), 0);
    }

    #[test]
    fn commands_are_bounded_by_phase_timeouts() {
        let mock = MockCommandRunner::replying(br#"{"translated_text": "namaste"}"#);
        let mut config = Config::default();
        config.pipeline.translation_timeout_ms = 1234;
        config.models.translation.command = Some(vec!["nllb".to_string()]);

        let context = ServiceContext::from_config(&config, Arc::new(mock.clone())).unwrap();
        context
            .translator
            .translate("hello", Language::En, Language::Hi)
            .unwrap();

        assert_eq!(mock.timeouts(), vec![Some(Duration::from_millis(1234))]);
    }

    #[test]
    fn missing_whisper_model_is_an_error() {
        let mut config = Config::default();
        config.models.stt.whisper_model = Some("/nonexistent/ggml.bin".into());

        assert!(ServiceContext::from_config(&config, runner()).is_err());
    }

    #[test]
    fn builders_replace_optional_adapters() {
        let context = ServiceContext::new(
            Arc::new(MockTranscriber::new("mock")),
            Arc::new(MockAudioEmotion::new()),
        )
        .with_synthesizer(Synthesizer::tone_only());

        assert_eq!(
            context.synthesizer.as_ref().map(|s| s.engine_names()),
            Some(vec!["tone".to_string()])
        );
        assert!((context.fallback_synthesizer)().is_ok());
    }
}
