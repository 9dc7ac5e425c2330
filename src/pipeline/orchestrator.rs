//! End-to-end speech-to-speech run.
//!
//! One [`Pipeline::run`] call drives one utterance through normalize, silence
//! gate, STT + audio emotion, text emotion, fusion, dialect, translation and
//! synthesis, then persists the artifact. Model calls are blocking, so each
//! is dispatched with `spawn_blocking` and awaited under its phase timeout.

use crate::audio::{SilenceGate, Waveform, normalize_audio};
use crate::config::{Config, PipelineConfig};
use crate::dialect::Dialect;
use crate::emotion::{Emotion, EmotionPrediction, FusionConfig, TextEmotionClassifier, fuse};
use crate::error::{Phase, Result, VoxbridgeError};
use crate::language::Language;
use crate::pipeline::context::ServiceContext;
use crate::pipeline::latency::{PhaseClock, PhaseTimings, realtime_factor};
use crate::pipeline::storage::OutputStore;
use crate::pipeline::types::{Enhancement, PipelineResult};
use crate::stt::TranscriptionResult;
use crate::tts::SynthesisRequest;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Orchestrator tuning taken from [`Config`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSettings {
    pub pipeline: PipelineConfig,
    pub silence: SilenceGate,
    pub fusion: FusionConfig,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            pipeline: config.pipeline.clone(),
            silence: config.silence,
            fusion: config.fusion,
        }
    }
}

/// Speech-to-speech orchestrator.
///
/// Holds no per-request state; concurrent runs share only the adapters in
/// the [`ServiceContext`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    context: ServiceContext,
    settings: PipelineSettings,
    store: OutputStore,
}

/// Run blocking adapter work on the blocking pool.
pub(crate) async fn blocking<T, F>(stage: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| VoxbridgeError::backend(stage, format!("worker task failed: {}", e)))?
}

/// Await `work`, failing with `PhaseTimeout` after `timeout_ms`.
pub(crate) async fn within<T>(
    phase: Phase,
    timeout_ms: u64,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(phase = %phase, timeout_ms, "Phase timed out");
            Err(VoxbridgeError::PhaseTimeout { phase, timeout_ms })
        }
    }
}

impl Pipeline {
    pub fn new(context: ServiceContext, settings: PipelineSettings) -> Self {
        let store = OutputStore::new(settings.pipeline.outputs_dir.clone());
        Self {
            context,
            settings,
            store,
        }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.context
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Like [`Pipeline::run`] with a caller-supplied target code.
    ///
    /// # Errors
    /// `VoxbridgeError::InvalidInput` for an unsupported code, before any
    /// audio is decoded.
    pub async fn run_with_code(&self, audio: Vec<u8>, target: &str) -> Result<PipelineResult> {
        let target = Language::parse(target)?;
        self.run(audio, target).await
    }

    /// Translate one utterance into `target` speech.
    ///
    /// Returns exactly one result or one error. The whole run is bounded by
    /// `pipeline.total_timeout_ms`; on expiry the in-flight phase is dropped
    /// and `VoxbridgeError::PipelineTimeout` is returned.
    ///
    /// # Errors
    /// - `InvalidAudio` if the bytes cannot be decoded
    /// - `PhaseTimeout` for STT + emotion, translation or synthesis
    /// - `Backend` if an essential adapter fails
    pub async fn run(&self, audio: Vec<u8>, target: Language) -> Result<PipelineResult> {
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", session = %session_id, target = %target);
        let timeout_ms = self.settings.pipeline.total_timeout_ms;

        let run = self.run_session(session_id, audio, target).instrument(span);
        match tokio::time::timeout(self.settings.pipeline.total_timeout(), run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(session = %session_id, timeout_ms, "Pipeline deadline exceeded");
                Err(VoxbridgeError::PipelineTimeout { timeout_ms })
            }
        }
    }

    async fn run_session(
        &self,
        session_id: Uuid,
        audio: Vec<u8>,
        target: Language,
    ) -> Result<PipelineResult> {
        let started = Instant::now();
        let mut timings = PhaseTimings::default();
        let limits = &self.settings.pipeline;

        let store = self.store.clone();
        blocking("output", move || store.ensure_dir()).await?;

        let wave = blocking("normalization", move || normalize_audio(&audio)).await?;
        timings.normalize_ms = Some(started.elapsed().as_millis() as u64);
        let audio_duration_secs = wave.duration_secs();
        tracing::debug!(
            samples = wave.len(),
            duration_secs = audio_duration_secs,
            "Normalized input audio"
        );

        if self.settings.silence.is_untranscribable(wave.samples()) {
            tracing::info!("Input is silent, skipping recognition");
            let audio_path = self.write_artifact(session_id, Vec::new()).await?;
            return Ok(PipelineResult {
                session_id,
                transcript: String::new(),
                detected_language: limits.default_language,
                target_language: target,
                detected_emotion: Emotion::Neutral,
                emotion_confidence: 1.0,
                detected_dialect: Dialect::StandardTelugu,
                translated_text: String::new(),
                audio_path,
                audio_duration_secs,
                latency_ms: started.elapsed().as_millis() as u64,
                timings,
            });
        }

        let wave = Arc::new(wave);
        let clock = PhaseClock::start(Phase::SttEmotion);
        let recognition = async {
            tokio::try_join!(
                self.transcribe_wave(wave.clone()),
                self.classify_wave(wave.clone())
            )
        };
        let (transcription, audio_emotion) =
            within(Phase::SttEmotion, limits.stt_emotion_timeout_ms, recognition).await?;
        clock.stop(&mut timings);

        let transcript = transcription.text;
        let has_speech = !transcript.trim().is_empty();
        let detected_language = match Language::parse(&transcription.language) {
            Ok(language) => language,
            Err(_) => {
                tracing::warn!(
                    reported = %transcription.language,
                    fallback = %limits.default_language,
                    "Recognizer reported an unsupported language, using default"
                );
                limits.default_language
            }
        };
        tracing::debug!(
            language = %detected_language,
            chars = transcript.len(),
            audio_emotion = %audio_emotion.label,
            "Recognition finished"
        );

        let text_emotion = match &self.context.text_emotion {
            Some(classifier) if detected_language == Language::En && has_speech => {
                let clock = PhaseClock::start(Phase::TextEmotion);
                let outcome = self.classify_text(classifier.clone(), transcript.clone()).await;
                clock.stop(&mut timings);
                match outcome {
                    Enhancement::Produced(prediction) => Some(prediction),
                    Enhancement::TimedOut => {
                        tracing::warn!(
                            timeout_ms = limits.text_emotion_timeout_ms,
                            "Text emotion timed out, keeping audio emotion"
                        );
                        None
                    }
                    Enhancement::Failed(e) => {
                        tracing::warn!(error = %e, "Text emotion failed, keeping audio emotion");
                        None
                    }
                }
            }
            _ => None,
        };

        let emotion = fuse(&audio_emotion, text_emotion.as_ref(), &self.settings.fusion);

        let detected_dialect = if detected_language == Language::Te && has_speech {
            let prediction = self.context.dialect.detect(&transcript);
            tracing::debug!(dialect = %prediction.dialect, confidence = prediction.confidence, "Detected dialect");
            prediction.dialect
        } else {
            Dialect::StandardTelugu
        };

        let translated_text = if !has_speech {
            String::new()
        } else if detected_language == target {
            transcript.clone()
        } else {
            let clock = PhaseClock::start(Phase::Translation);
            let service = self.context.translator.clone();
            let text = transcript.clone();
            let translated = within(
                Phase::Translation,
                limits.translation_timeout_ms,
                blocking("translation", move || {
                    service.translate(&text, detected_language, target)
                }),
            )
            .await?;
            clock.stop(&mut timings);
            translated.translated_text
        };

        let speech = if translated_text.trim().is_empty() {
            tracing::debug!("Nothing to speak, writing empty artifact");
            Vec::new()
        } else {
            let request = SynthesisRequest::new(&translated_text, target, emotion.label)?;
            let clock = PhaseClock::start(Phase::Synthesis);
            let speech = self.synthesize_for_run(request).await?;
            clock.stop(&mut timings);
            speech
        };

        let audio_path = self.write_artifact(session_id, speech).await?;
        let elapsed = started.elapsed();

        tracing::info!(
            language = %detected_language,
            emotion = %emotion.label,
            latency_ms = elapsed.as_millis() as u64,
            rtf = realtime_factor(elapsed, audio_duration_secs),
            "Pipeline run complete"
        );

        Ok(PipelineResult {
            session_id,
            transcript,
            detected_language,
            target_language: target,
            detected_emotion: emotion.label,
            emotion_confidence: emotion.confidence,
            detected_dialect,
            translated_text,
            audio_path,
            audio_duration_secs,
            latency_ms: elapsed.as_millis() as u64,
            timings,
        })
    }

    pub(crate) async fn transcribe_wave(&self, wave: Arc<Waveform>) -> Result<TranscriptionResult> {
        let transcriber = self.context.transcriber.clone();
        blocking("transcription", move || {
            transcriber.transcribe(wave.samples(), wave.sample_rate())
        })
        .await
    }

    /// Audio emotion, skipping the classifier below the looser threshold.
    pub(crate) async fn classify_wave(&self, wave: Arc<Waveform>) -> Result<EmotionPrediction> {
        if self.settings.silence.is_emotionally_neutral(wave.samples()) {
            tracing::debug!("Audio too quiet for emotion, assuming neutral");
            return Ok(EmotionPrediction::neutral());
        }
        let classifier = self.context.audio_emotion.clone();
        blocking("audio emotion", move || {
            classifier.predict(wave.samples(), wave.sample_rate())
        })
        .await
    }

    async fn classify_text(
        &self,
        classifier: Arc<dyn TextEmotionClassifier>,
        text: String,
    ) -> Enhancement<EmotionPrediction> {
        let limit = Duration::from_millis(self.settings.pipeline.text_emotion_timeout_ms);
        let work = blocking("text emotion", move || classifier.predict(&text));
        match tokio::time::timeout(limit, work).await {
            Ok(Ok(prediction)) => Enhancement::Produced(prediction),
            Ok(Err(e)) => Enhancement::Failed(e),
            Err(_) => Enhancement::TimedOut,
        }
    }

    /// Synthesis inside a run: a loaded synthesizer's timeout or failure
    /// propagates, while the fallback attempt only ever degrades to silence.
    async fn synthesize_for_run(&self, request: SynthesisRequest) -> Result<Vec<u8>> {
        let timeout_ms = self.settings.pipeline.synthesis_timeout_ms;

        if let Some(synthesizer) = &self.context.synthesizer {
            let synthesizer = synthesizer.clone();
            return within(
                Phase::Synthesis,
                timeout_ms,
                blocking("synthesis", move || synthesizer.synthesize(&request)),
            )
            .await;
        }

        tracing::warn!("No synthesizer loaded, attempting fallback");
        match self.fallback_synthesis(request).await {
            Enhancement::Produced(speech) => Ok(speech),
            Enhancement::TimedOut => {
                tracing::warn!(timeout_ms, "Fallback synthesis timed out, writing empty artifact");
                Ok(Vec::new())
            }
            Enhancement::Failed(e) => {
                tracing::warn!(error = %e, "Fallback synthesis failed, writing empty artifact");
                Ok(Vec::new())
            }
        }
    }

    pub(crate) async fn fallback_synthesis(&self, request: SynthesisRequest) -> Enhancement<Vec<u8>> {
        let factory = self.context.fallback_synthesizer.clone();
        let limit = Duration::from_millis(self.settings.pipeline.synthesis_timeout_ms);
        let work = blocking("synthesis", move || {
            let synthesizer = factory()?;
            synthesizer.synthesize(&request)
        });
        match tokio::time::timeout(limit, work).await {
            Ok(Ok(speech)) => Enhancement::Produced(speech),
            Ok(Err(e)) => Enhancement::Failed(e),
            Err(_) => Enhancement::TimedOut,
        }
    }

    async fn write_artifact(&self, session_id: Uuid, speech: Vec<u8>) -> Result<PathBuf> {
        let store = self.store.clone();
        let path = blocking("output", move || store.write(session_id, &speech)).await?;
        tracing::debug!(path = %path.display(), "Wrote output artifact");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::codec::test_support::make_wav_f32;
    use crate::emotion::{MockAudioEmotion, MockTextEmotion};
    use crate::error::ErrorKind;
    use crate::stt::MockTranscriber;
    use crate::translate::MockTranslator;
    use crate::tts::{MockVoiceEngine, Synthesizer};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sine(seconds: f32) -> Vec<u8> {
        let samples: Vec<f32> = (0..(16000.0 * seconds) as usize)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
            .collect();
        make_wav_f32(16000, 1, &samples)
    }

    fn settings(dir: &TempDir) -> PipelineSettings {
        let mut settings = PipelineSettings::default();
        settings.pipeline.outputs_dir = dir.path().to_path_buf();
        settings
    }

    fn context(transcriber: MockTranscriber) -> ServiceContext {
        ServiceContext::new(Arc::new(transcriber), Arc::new(MockAudioEmotion::new()))
            .with_translator(Arc::new(MockTranslator::new()))
            .with_synthesizer(Synthesizer::new(vec![Arc::new(MockVoiceEngine::new("mock"))]))
    }

    fn prediction(label: Emotion, confidence: f64) -> EmotionPrediction {
        let mut scores: BTreeMap<Emotion, f64> =
            Emotion::ALL.iter().map(|&e| (e, 0.0)).collect();
        scores.insert(label, confidence);
        scores.insert(Emotion::Neutral, 1.0 - confidence);
        EmotionPrediction {
            label,
            confidence,
            scores,
        }
    }

    #[tokio::test]
    async fn english_speech_is_translated_and_synthesized() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_response("hello there")),
            settings(&dir),
        );

        let result = pipeline.run(sine(1.0), Language::Hi).await.unwrap();

        assert_eq!(result.transcript, "hello there");
        assert_eq!(result.detected_language, Language::En);
        assert_eq!(result.translated_text, "[hi] hello there");
        assert_eq!(result.detected_dialect, Dialect::StandardTelugu);
        assert!(std::fs::metadata(&result.audio_path).unwrap().len() > 0);
        assert_eq!(result.audio_path, dir.path().join(format!("{}.wav", result.session_id)));
        assert!(result.timings.stt_emotion_ms.is_some());
        assert!(result.timings.translation_ms.is_some());
    }

    #[tokio::test]
    async fn identity_language_skips_translator() {
        let dir = TempDir::new().unwrap();
        let translator = MockTranslator::new();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_response("hello"))
                .with_translator(Arc::new(translator.clone())),
            settings(&dir),
        );

        let result = pipeline.run(sine(0.5), Language::En).await.unwrap();

        assert_eq!(result.translated_text, result.transcript);
        assert_eq!(translator.call_count(), 0);
        assert!(result.timings.translation_ms.is_none());
    }

    #[tokio::test]
    async fn silent_input_short_circuits() {
        let dir = TempDir::new().unwrap();
        let transcriber = MockTranscriber::new("mock");
        let pipeline = Pipeline::new(context(transcriber.clone()), settings(&dir));

        let silence = make_wav_f32(16000, 1, &vec![0.0; 16000]);
        let result = pipeline.run(silence, Language::Hi).await.unwrap();

        assert_eq!(result.transcript, "");
        assert_eq!(result.detected_emotion, Emotion::Neutral);
        assert_eq!(result.emotion_confidence, 1.0);
        assert_eq!(result.detected_dialect, Dialect::StandardTelugu);
        assert_eq!(result.translated_text, "");
        assert_eq!(std::fs::metadata(&result.audio_path).unwrap().len(), 0);
        assert_eq!(transcriber.call_count(), 0);
    }

    #[tokio::test]
    async fn undecodable_audio_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(context(MockTranscriber::new("mock")), settings(&dir));

        let err = pipeline.run(b"not audio".to_vec(), Language::Hi).await.unwrap_err();
        assert!(matches!(err, VoxbridgeError::InvalidAudio { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn unsupported_target_code_is_rejected_before_decoding() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(context(MockTranscriber::new("mock")), settings(&dir));

        let err = pipeline.run_with_code(b"junk".to_vec(), "fr").await.unwrap_err();
        assert!(matches!(err, VoxbridgeError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn unsupported_detected_language_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_language("fr").with_response("bonjour")),
            settings(&dir),
        );

        let result = pipeline.run(sine(0.5), Language::Hi).await.unwrap();
        assert_eq!(result.detected_language, Language::En);
    }

    #[tokio::test]
    async fn transcription_failure_propagates_as_backend_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_failure()),
            settings(&dir),
        );

        let err = pipeline.run(sine(0.5), Language::Hi).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[tokio::test]
    async fn slow_transcription_is_a_phase_timeout() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.pipeline.stt_emotion_timeout_ms = 20;
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_delay(Duration::from_millis(300))),
            settings,
        );

        let err = pipeline.run(sine(0.5), Language::Hi).await.unwrap_err();
        assert!(matches!(
            err,
            VoxbridgeError::PhaseTimeout {
                phase: Phase::SttEmotion,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn confident_text_emotion_overrides_weak_audio() {
        let dir = TempDir::new().unwrap();
        let context = ServiceContext::new(
            Arc::new(MockTranscriber::new("mock").with_response("this is wonderful")),
            Arc::new(MockAudioEmotion::new().with_response(prediction(Emotion::Sad, 0.2))),
        )
        .with_text_emotion(Arc::new(
            MockTextEmotion::new().with_response(prediction(Emotion::Happy, 0.9)),
        ))
        .with_synthesizer(Synthesizer::new(vec![Arc::new(MockVoiceEngine::new("mock"))]));
        let pipeline = Pipeline::new(context, settings(&dir));

        let result = pipeline.run(sine(0.5), Language::En).await.unwrap();

        assert_eq!(result.detected_emotion, Emotion::Happy);
        assert_eq!(result.emotion_confidence, 0.9);
    }

    #[tokio::test]
    async fn text_emotion_failure_keeps_audio_emotion() {
        let dir = TempDir::new().unwrap();
        let context = ServiceContext::new(
            Arc::new(MockTranscriber::new("mock").with_response("hello")),
            Arc::new(MockAudioEmotion::new().with_response(prediction(Emotion::Angry, 0.7))),
        )
        .with_text_emotion(Arc::new(MockTextEmotion::new().with_failure()))
        .with_synthesizer(Synthesizer::new(vec![Arc::new(MockVoiceEngine::new("mock"))]));
        let pipeline = Pipeline::new(context, settings(&dir));

        let result = pipeline.run(sine(0.5), Language::En).await.unwrap();

        assert_eq!(result.detected_emotion, Emotion::Angry);
        assert_eq!(result.emotion_confidence, 0.7);
    }

    #[tokio::test]
    async fn text_emotion_skipped_for_non_english() {
        let dir = TempDir::new().unwrap();
        let text_emotion = MockTextEmotion::new();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_language("hi").with_response("namaste"))
                .with_text_emotion(Arc::new(text_emotion.clone())),
            settings(&dir),
        );

        pipeline.run(sine(0.5), Language::En).await.unwrap();
        assert_eq!(text_emotion.call_count(), 0);
    }

    #[tokio::test]
    async fn telugu_transcript_gets_dialect() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_language("te").with_response("emo ra")),
            settings(&dir),
        );

        let result = pipeline.run(sine(0.5), Language::En).await.unwrap();
        assert_eq!(result.detected_dialect, Dialect::Telangana);
    }

    #[tokio::test]
    async fn translation_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_response("hello"))
                .with_translator(Arc::new(MockTranslator::new().with_failure())),
            settings(&dir),
        );

        let err = pipeline.run(sine(0.5), Language::Te).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[tokio::test]
    async fn synthesis_failure_with_loaded_synthesizer_propagates() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_response("hello")).with_synthesizer(
                Synthesizer::new(vec![Arc::new(MockVoiceEngine::new("mock").with_failure())]),
            ),
            settings(&dir),
        );

        let err = pipeline.run(sine(0.5), Language::Hi).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[tokio::test]
    async fn missing_synthesizer_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let mut context = context(MockTranscriber::new("mock").with_response("hello"));
        context.synthesizer = None;
        let pipeline = Pipeline::new(context, settings(&dir));

        let result = pipeline.run(sine(0.5), Language::Hi).await.unwrap();
        assert!(std::fs::metadata(&result.audio_path).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn failing_fallback_degrades_to_empty_artifact() {
        let dir = TempDir::new().unwrap();
        let mut context = context(MockTranscriber::new("mock").with_response("hello"))
            .with_fallback_synthesizer(Arc::new(|| {
                Err(VoxbridgeError::BackendUnavailable {
                    stage: "synthesis".to_string(),
                    message: "no voices installed".to_string(),
                })
            }));
        context.synthesizer = None;
        let pipeline = Pipeline::new(context, settings(&dir));

        let result = pipeline.run(sine(0.5), Language::Hi).await.unwrap();
        assert_eq!(std::fs::metadata(&result.audio_path).unwrap().len(), 0);
        assert_eq!(result.translated_text, "[hi] hello");
    }

    #[tokio::test]
    async fn slow_text_emotion_keeps_audio_emotion() {
        let dir = TempDir::new().unwrap();
        let text_emotion = MockTextEmotion::new()
            .with_response(prediction(Emotion::Happy, 0.9))
            .with_delay(Duration::from_millis(500));
        let context = ServiceContext::new(
            Arc::new(MockTranscriber::new("mock").with_response("hello")),
            Arc::new(MockAudioEmotion::new().with_response(prediction(Emotion::Sad, 0.8))),
        )
        .with_text_emotion(Arc::new(text_emotion.clone()))
        .with_synthesizer(Synthesizer::new(vec![Arc::new(MockVoiceEngine::new("mock"))]));
        let mut settings = settings(&dir);
        settings.pipeline.text_emotion_timeout_ms = 50;
        let pipeline = Pipeline::new(context, settings);

        let result = pipeline.run(sine(0.5), Language::En).await.unwrap();

        assert_eq!(text_emotion.call_count(), 1);
        assert_eq!(result.detected_emotion, Emotion::Sad);
        assert_eq!(result.emotion_confidence, 0.8);
        assert!(std::fs::metadata(&result.audio_path).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn slow_loaded_synthesizer_times_out() {
        let dir = TempDir::new().unwrap();
        let pipeline_context = context(MockTranscriber::new("mock").with_response("hello"))
            .with_synthesizer(Synthesizer::new(vec![Arc::new(
                MockVoiceEngine::new("slow").with_delay(Duration::from_millis(500)),
            )]));
        let mut settings = settings(&dir);
        settings.pipeline.synthesis_timeout_ms = 50;
        let pipeline = Pipeline::new(pipeline_context, settings);

        let err = pipeline.run(sine(0.5), Language::Hi).await.unwrap_err();

        match err {
            VoxbridgeError::PhaseTimeout { phase, timeout_ms } => {
                assert_eq!(phase, Phase::Synthesis);
                assert_eq!(timeout_ms, 50);
            }
            other => panic!("Expected PhaseTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_fallback_degrades_to_empty_artifact() {
        let dir = TempDir::new().unwrap();
        let mut pipeline_context = context(MockTranscriber::new("mock").with_response("hello"))
            .with_fallback_synthesizer(Arc::new(|| {
                Ok(Synthesizer::new(vec![Arc::new(
                    MockVoiceEngine::new("slow").with_delay(Duration::from_millis(500)),
                )]))
            }));
        pipeline_context.synthesizer = None;
        let mut settings = settings(&dir);
        settings.pipeline.synthesis_timeout_ms = 50;
        let pipeline = Pipeline::new(pipeline_context, settings);

        let result = pipeline.run(sine(0.5), Language::Hi).await.unwrap();

        assert_eq!(std::fs::metadata(&result.audio_path).unwrap().len(), 0);
        assert_eq!(result.translated_text, "[hi] hello");
    }

    #[tokio::test]
    async fn transcript_is_reported_verbatim() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_response("  hello  ")),
            settings(&dir),
        );

        let result = pipeline.run(sine(0.5), Language::En).await.unwrap();

        assert_eq!(result.transcript, "  hello  ");
        assert_eq!(result.translated_text, "  hello  ");
    }

    #[tokio::test]
    async fn blank_transcript_skips_translation() {
        let dir = TempDir::new().unwrap();
        let translator = MockTranslator::new();
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_response("   "))
                .with_translator(Arc::new(translator.clone())),
            settings(&dir),
        );

        let result = pipeline.run(sine(0.5), Language::Hi).await.unwrap();

        assert_eq!(result.transcript, "   ");
        assert_eq!(result.translated_text, "");
        assert_eq!(translator.call_count(), 0);
        assert_eq!(std::fs::metadata(&result.audio_path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn whole_run_is_bounded_by_total_timeout() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.pipeline.total_timeout_ms = 30;
        let pipeline = Pipeline::new(
            context(MockTranscriber::new("mock").with_delay(Duration::from_millis(300))),
            settings,
        );

        let err = pipeline.run(sine(0.5), Language::Hi).await.unwrap_err();
        assert!(matches!(err, VoxbridgeError::PipelineTimeout { timeout_ms: 30 }));
    }

    #[test]
    fn settings_come_from_config() {
        let mut config = Config::default();
        config.pipeline.translation_timeout_ms = 1234;
        config.fusion.audio_weight = 0.5;

        let settings = PipelineSettings::from(&config);
        assert_eq!(settings.pipeline.translation_timeout_ms, 1234);
        assert_eq!(settings.fusion.audio_weight, 0.5);
    }
}
