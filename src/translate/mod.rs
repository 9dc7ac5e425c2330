//! Text translation between the supported languages.
//!
//! [`Translator`] is the backend seam. [`TranslationService`] sits in front
//! of every backend and owns the input rules: non-empty text, supported
//! codes, and the identity short-circuit that never reaches the backend.

use crate::error::{Result, VoxbridgeError};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
    /// Identifier of the model that produced the text.
    pub model: String,
}

/// Translation backend. Blocking.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: Language, target: Language)
    -> Result<TranslationResult>;

    fn model_name(&self) -> &str;
}

impl<T: Translator + ?Sized> Translator for Arc<T> {
    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult> {
        (**self).translate(text, source, target)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Validating front for a [`Translator`].
#[derive(Clone)]
pub struct TranslationService {
    backend: Arc<dyn Translator>,
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("backend", &self.backend.model_name())
            .finish()
    }
}

impl TranslationService {
    pub fn new(backend: Arc<dyn Translator>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Translate with caller-supplied language codes.
    ///
    /// # Errors
    /// `VoxbridgeError::InvalidInput` for empty text or an unsupported code.
    pub fn translate_codes(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslationResult> {
        ensure_text(text)?;
        let source = Language::parse(source)?;
        let target = Language::parse(target)?;
        self.translate(text, source, target)
    }

    /// Translate `text`; identical languages return it verbatim.
    pub fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult> {
        ensure_text(text)?;

        if source == target {
            return Ok(TranslationResult {
                translated_text: text.to_string(),
                model: self.backend.model_name().to_string(),
            });
        }

        let result = self.backend.translate(text, source, target)?;
        Ok(TranslationResult {
            translated_text: result.translated_text.trim().to_string(),
            model: result.model,
        })
    }
}

fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(VoxbridgeError::invalid_input(
            "Text to translate must be non-empty.",
        ));
    }
    Ok(())
}

/// Returns the input unchanged. Used when no translation model is configured.
#[derive(Debug, Clone, Default)]
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn translate(&self, text: &str, _: Language, _: Language) -> Result<TranslationResult> {
        Ok(TranslationResult {
            translated_text: text.to_string(),
            model: self.model_name().to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "passthrough"
    }
}

/// Mock translator for testing.
///
/// By default answers `"[<target>] <text>"`.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    response: Option<String>,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            response: None,
            should_fail: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Translator for MockTranslator {
    fn translate(&self, text: &str, _source: Language, target: Language) -> Result<TranslationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.should_fail {
            return Err(VoxbridgeError::backend("translation", "mock translation failure"));
        }
        let translated_text = match &self.response {
            Some(response) => response.clone(),
            None => format!("[{}] {}", target, text),
        };
        Ok(TranslationResult {
            translated_text,
            model: self.model_name().to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock-translator"
    }
}
