//! Command-line interface for voxbridge
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Emotion-aware speech-to-speech translation
#[derive(Parser, Debug)]
#[command(name = "voxbridge", version, about = "Emotion-aware speech-to-speech translation")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration into milliseconds.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`30s`, `2m`, `1m30s`).
pub fn parse_timeout_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon (foreground)
    Serve {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/voxbridge.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Translate a WAV file in-process, without a daemon
    Run {
        /// Input WAV file
        input: PathBuf,

        /// Target language (en, te, hi)
        #[arg(long, short = 't', value_name = "LANG")]
        to: String,

        /// Copy the synthesized audio here as well
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Outer deadline for the whole run (e.g. 90s, 2m)
        #[arg(long, value_name = "DURATION", value_parser = parse_timeout_ms)]
        timeout: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate a WAV file via the daemon
    TranslateSpeech {
        /// Input WAV file
        input: PathBuf,

        /// Target language (en, te, hi)
        #[arg(long, short = 't', value_name = "LANG")]
        to: String,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/voxbridge.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate text
    Translate {
        /// Text to translate
        text: String,

        /// Source language (en, te, hi)
        #[arg(long, short = 'f', value_name = "LANG")]
        from: String,

        /// Target language (en, te, hi)
        #[arg(long, short = 't', value_name = "LANG")]
        to: String,
    },

    /// Synthesize speech to a WAV file
    Synthesize {
        /// Text to speak
        text: String,

        /// Language (en, te, hi)
        #[arg(long, short = 'l', value_name = "LANG")]
        language: String,

        /// Emotion (neutral, happy, sad, angry, fearful)
        #[arg(long, short = 'e', value_name = "EMOTION", default_value = "neutral")]
        emotion: String,

        /// Output WAV file
        #[arg(long, short = 'o', value_name = "PATH", default_value = "speech.wav")]
        output: PathBuf,
    },

    /// Guess the Telugu dialect of a transcript
    Dialect {
        /// Transcript text
        text: String,
    },

    /// Ask the daemon which adapters are loaded
    Health {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/voxbridge.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Stop a running daemon
    Shutdown {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/voxbridge.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Print the built-in defaults as TOML
    Dump,
    /// Load and validate the configuration
    Check,
}
