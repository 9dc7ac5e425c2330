use crate::audio::SilenceGate;
use crate::defaults;
use crate::emotion::FusionConfig;
use crate::error::{Result, VoxbridgeError};
use crate::language::Language;
use crate::tts::VoiceTier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub silence: SilenceGate,
    pub fusion: FusionConfig,
    pub models: ModelsConfig,
    pub synthesis: SynthesisConfig,
    pub ipc: IpcConfig,
}

/// Orchestrator time budget and output location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub stt_emotion_timeout_ms: u64,
    pub text_emotion_timeout_ms: u64,
    pub translation_timeout_ms: u64,
    pub synthesis_timeout_ms: u64,
    /// Outer deadline around a whole run
    pub total_timeout_ms: u64,
    /// Substituted when the recognizer reports an unsupported language
    pub default_language: Language,
    pub outputs_dir: PathBuf,
}

/// External model backends. An absent command selects the built-in fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ModelsConfig {
    pub stt: SttModelConfig,
    pub audio_emotion: ModelCommandConfig,
    pub text_emotion: ModelCommandConfig,
    pub translation: ModelCommandConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SttModelConfig {
    /// Subprocess recognizer argv
    pub command: Option<Vec<String>>,
    /// Native Whisper model file (requires the `whisper` feature)
    pub whisper_model: Option<PathBuf>,
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ModelCommandConfig {
    pub command: Option<Vec<String>>,
}

/// Speech synthesis tiers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    /// When false no synthesizer is loaded and every run takes the
    /// best-effort fallback path.
    pub enabled: bool,
    /// Tiers to try, in order
    pub tiers: Vec<VoiceTier>,
    /// Neural TTS argv; `{lang}` and `{emotion}` are substituted
    pub neural_command: Option<Vec<String>>,
    pub neural_sample_rate: u32,
    pub system_command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct IpcConfig {
    pub socket: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stt_emotion_timeout_ms: defaults::STT_EMOTION_TIMEOUT_MS,
            text_emotion_timeout_ms: defaults::TEXT_EMOTION_TIMEOUT_MS,
            translation_timeout_ms: defaults::TRANSLATION_TIMEOUT_MS,
            synthesis_timeout_ms: defaults::SYNTHESIS_TIMEOUT_MS,
            total_timeout_ms: defaults::TOTAL_TIMEOUT_MS,
            default_language: Language::default_language(),
            outputs_dir: PathBuf::from(defaults::OUTPUTS_DIR),
        }
    }
}

impl PipelineConfig {
    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tiers: vec![VoiceTier::Neural, VoiceTier::System, VoiceTier::Tone],
            neural_command: None,
            neural_sample_rate: defaults::NEURAL_SAMPLE_RATE,
            system_command: defaults::SYSTEM_VOICE_COMMAND.to_string(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> VoxbridgeError {
    VoxbridgeError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, or defaults if the file doesn't exist.
    ///
    /// Only a missing file yields defaults; unreadable or invalid files are
    /// errors.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(VoxbridgeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXBRIDGE_OUTPUTS_DIR → pipeline.outputs_dir
    /// - VOXBRIDGE_SOCKET → ipc.socket
    /// - VOXBRIDGE_TOTAL_TIMEOUT_MS → pipeline.total_timeout_ms
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("VOXBRIDGE_OUTPUTS_DIR")
            && !dir.is_empty()
        {
            self.pipeline.outputs_dir = PathBuf::from(dir);
        }

        if let Ok(socket) = std::env::var("VOXBRIDGE_SOCKET")
            && !socket.is_empty()
        {
            self.ipc.socket = Some(PathBuf::from(socket));
        }

        if let Ok(timeout) = std::env::var("VOXBRIDGE_TOTAL_TIMEOUT_MS")
            && !timeout.is_empty()
        {
            match timeout.parse::<u64>() {
                Ok(ms) => self.pipeline.total_timeout_ms = ms,
                Err(e) => tracing::warn!(
                    value = %timeout,
                    error = %e,
                    "Ignoring unparsable VOXBRIDGE_TOTAL_TIMEOUT_MS"
                ),
            }
        }

        self
    }

    /// Check value ranges that TOML types cannot express.
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("pipeline.stt_emotion_timeout_ms", self.pipeline.stt_emotion_timeout_ms),
            ("pipeline.text_emotion_timeout_ms", self.pipeline.text_emotion_timeout_ms),
            ("pipeline.translation_timeout_ms", self.pipeline.translation_timeout_ms),
            ("pipeline.synthesis_timeout_ms", self.pipeline.synthesis_timeout_ms),
            ("pipeline.total_timeout_ms", self.pipeline.total_timeout_ms),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(invalid(key, "must be greater than zero"));
            }
        }

        let thresholds = [
            ("silence.transcription_threshold", self.silence.transcription_threshold as f64),
            ("silence.emotion_threshold", self.silence.emotion_threshold as f64),
            ("fusion.text_min_confidence", self.fusion.text_min_confidence),
            ("fusion.audio_min_confidence", self.fusion.audio_min_confidence),
        ];
        for (key, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(key, format!("{} is outside [0, 1]", value)));
            }
        }

        if self.fusion.audio_weight < 0.0 || self.fusion.text_weight < 0.0 {
            return Err(invalid("fusion", "weights must be non-negative"));
        }
        if self.fusion.audio_weight + self.fusion.text_weight <= 0.0 {
            return Err(invalid("fusion", "weights must not both be zero"));
        }

        if self.synthesis.tiers.is_empty() {
            return Err(invalid("synthesis.tiers", "at least one tier is required"));
        }
        if self.synthesis.neural_sample_rate == 0 {
            return Err(invalid("synthesis.neural_sample_rate", "must be greater than zero"));
        }

        let commands = [
            ("models.stt.command", &self.models.stt.command),
            ("models.audio_emotion.command", &self.models.audio_emotion.command),
            ("models.text_emotion.command", &self.models.text_emotion.command),
            ("models.translation.command", &self.models.translation.command),
            ("synthesis.neural_command", &self.synthesis.neural_command),
        ];
        for (key, command) in commands {
            if command.as_ref().is_some_and(|argv| argv.is_empty()) {
                return Err(invalid(key, "command must name a program"));
            }
        }

        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxbridge/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxbridge")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_voxbridge_env() {
        remove_env("VOXBRIDGE_OUTPUTS_DIR");
        remove_env("VOXBRIDGE_SOCKET");
        remove_env("VOXBRIDGE_TOTAL_TIMEOUT_MS");
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.pipeline.stt_emotion_timeout_ms, 30_000);
        assert_eq!(config.pipeline.text_emotion_timeout_ms, 10_000);
        assert_eq!(config.pipeline.translation_timeout_ms, 30_000);
        assert_eq!(config.pipeline.synthesis_timeout_ms, 30_000);
        assert_eq!(config.pipeline.total_timeout_ms, 120_000);
        assert_eq!(config.pipeline.default_language, Language::En);
        assert_eq!(config.pipeline.outputs_dir, PathBuf::from("outputs"));

        assert_eq!(config.silence.transcription_threshold, 1e-5);
        assert_eq!(config.silence.emotion_threshold, 1e-4);

        assert_eq!(config.fusion.audio_weight, 0.65);
        assert_eq!(config.fusion.text_weight, 0.35);

        assert!(config.synthesis.enabled);
        assert_eq!(
            config.synthesis.tiers,
            vec![VoiceTier::Neural, VoiceTier::System, VoiceTier::Tone]
        );
        assert_eq!(config.synthesis.system_command, "espeak-ng");
        assert!(config.models.text_emotion.command.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_temp(
            r#"
            [pipeline]
            translation_timeout_ms = 5000
            total_timeout_ms = 15000
            default_language = "te"
            outputs_dir = "/var/lib/voxbridge"

            [silence]
            transcription_threshold = 0.001
            emotion_threshold = 0.01

            [fusion]
            audio_weight = 0.5
            text_weight = 0.5

            [models.stt]
            command = ["whisper-json", "--model", "small"]

            [models.text_emotion]
            command = ["text-emotion"]

            [synthesis]
            tiers = ["system", "tone"]
            system_command = "espeak"

            [ipc]
            socket = "/tmp/vox.sock"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.pipeline.translation_timeout_ms, 5000);
        assert_eq!(config.pipeline.total_timeout_ms, 15000);
        assert_eq!(config.pipeline.default_language, Language::Te);
        assert_eq!(config.pipeline.outputs_dir, PathBuf::from("/var/lib/voxbridge"));
        assert_eq!(config.silence.transcription_threshold, 0.001);
        assert_eq!(config.fusion.audio_weight, 0.5);
        assert_eq!(
            config.models.stt.command,
            Some(vec![
                "whisper-json".to_string(),
                "--model".to_string(),
                "small".to_string()
            ])
        );
        assert_eq!(config.synthesis.tiers, vec![VoiceTier::System, VoiceTier::Tone]);
        assert_eq!(config.synthesis.system_command, "espeak");
        assert_eq!(config.ipc.socket, Some(PathBuf::from("/tmp/vox.sock")));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_temp(
            r#"
            [pipeline]
            synthesis_timeout_ms = 1234
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.pipeline.synthesis_timeout_ms, 1234);
        assert_eq!(config.pipeline.stt_emotion_timeout_ms, 30_000);
        assert_eq!(config.fusion, FusionConfig::default());
        assert_eq!(config.synthesis, SynthesisConfig::default());
    }

    #[test]
    fn test_unsupported_default_language_is_rejected() {
        let temp_file = write_temp(
            r#"
            [pipeline]
            default_language = "fr"
        "#,
        );
        assert!(matches!(
            Config::load(temp_file.path()),
            Err(VoxbridgeError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxbridge_env();

        set_env("VOXBRIDGE_OUTPUTS_DIR", "/srv/out");
        set_env("VOXBRIDGE_SOCKET", "/run/vox.sock");
        set_env("VOXBRIDGE_TOTAL_TIMEOUT_MS", "15000");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.pipeline.outputs_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.ipc.socket, Some(PathBuf::from("/run/vox.sock")));
        assert_eq!(config.pipeline.total_timeout_ms, 15000);

        clear_voxbridge_env();
    }

    #[test]
    fn test_env_override_empty_or_invalid_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxbridge_env();

        set_env("VOXBRIDGE_OUTPUTS_DIR", "");
        set_env("VOXBRIDGE_TOTAL_TIMEOUT_MS", "soon");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.pipeline.outputs_dir, PathBuf::from("outputs"));
        assert_eq!(config.pipeline.total_timeout_ms, 120_000);

        clear_voxbridge_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_temp(
            r#"
            [pipeline
            outputs_dir = "broken
        "#,
        );

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_voxbridge_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = Config::default_path();
        assert!(path.ends_with("voxbridge/config.toml"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.pipeline.translation_timeout_ms = 0;
        match config.validate() {
            Err(VoxbridgeError::ConfigInvalidValue { key, .. }) => {
                assert_eq!(key, "pipeline.translation_timeout_ms");
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.fusion.text_min_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_weights() {
        let mut config = Config::default();
        config.fusion.audio_weight = 0.0;
        config.fusion.text_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_tiers_and_commands() {
        let mut config = Config::default();
        config.synthesis.tiers.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.models.translation.command = Some(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
