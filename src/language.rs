//! Supported language codes.

use crate::defaults;
use crate::error::{Result, VoxbridgeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three languages every stage supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Te,
    Hi,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Te, Language::Hi];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Te => "te",
            Language::Hi => "hi",
        }
    }

    /// Strict parse for caller-supplied codes.
    ///
    /// Anything outside the supported set is an input validation error.
    pub fn parse(code: &str) -> Result<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "te" => Ok(Language::Te),
            "hi" => Ok(Language::Hi),
            other => Err(VoxbridgeError::invalid_input(format!(
                "Unsupported language code '{}'. Expected one of: en, te, hi.",
                other
            ))),
        }
    }

    /// Lenient mapping for codes reported by a recognizer.
    ///
    /// Unknown or empty codes degrade to `fallback` instead of failing, since
    /// translation downstream needs one of the supported languages.
    pub fn coerce(detected: &str, fallback: Language) -> Self {
        Self::parse(detected).unwrap_or(fallback)
    }

    /// The configured fallback language, or English if that is invalid too.
    pub fn default_language() -> Self {
        Self::parse(defaults::DEFAULT_LANGUAGE).unwrap_or(Language::En)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = VoxbridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_accepts_supported_codes_case_insensitively() {
        assert_eq!(Language::parse("en").unwrap(), Language::En);
        assert_eq!(Language::parse("TE").unwrap(), Language::Te);
        assert_eq!(Language::parse(" hi ").unwrap(), Language::Hi);
    }

    #[test]
    fn parse_rejects_unsupported_code_as_invalid_input() {
        let err = Language::parse("fr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("'fr'"));
    }

    #[test]
    fn coerce_falls_back_for_unknown_codes() {
        assert_eq!(Language::coerce("de", Language::En), Language::En);
        assert_eq!(Language::coerce("", Language::Hi), Language::Hi);
        assert_eq!(Language::coerce("te", Language::En), Language::Te);
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        assert_eq!(serde_json::to_string(&Language::Te).unwrap(), "\"te\"");
        let parsed: Language = serde_json::from_str("\"hi\"").unwrap();
        assert_eq!(parsed, Language::Hi);
    }

    #[test]
    fn display_matches_code() {
        for lang in Language::ALL {
            assert_eq!(lang.to_string(), lang.code());
        }
    }
}
