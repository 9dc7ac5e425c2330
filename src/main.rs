use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use voxbridge::cli::{Cli, Commands, ConfigAction};
use voxbridge::config::Config;
use voxbridge::daemon::{build_pipeline, resolve_socket_path, run_daemon};
use voxbridge::ipc::{Command, Response, send_command};
use voxbridge::language::Language;
use voxbridge::pipeline::PipelineResult;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    voxbridge::logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Serve { socket } => {
            let config = load_config(cli.config.as_deref())?;
            run_daemon(config, socket).await?;
        }
        Commands::Run {
            input,
            to,
            output,
            timeout,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(ms) = timeout {
                config.pipeline.total_timeout_ms = ms;
            }
            config.validate()?;
            let target = Language::parse(&to)?;
            let audio = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let pipeline = build_pipeline(&config)?;
            let result = pipeline.run(audio, target).await?;

            if let Some(dest) = output {
                std::fs::copy(&result.audio_path, &dest)
                    .with_context(|| format!("Failed to copy audio to {}", dest.display()))?;
            }
            print_pipeline_result(&result, json)?;
        }
        Commands::TranslateSpeech {
            input,
            to,
            socket,
            json,
        } => {
            // The daemon resolves relative paths against its own cwd
            let audio_path = std::fs::canonicalize(&input)
                .with_context(|| format!("Failed to resolve {}", input.display()))?;
            let command = Command::TranslateSpeech {
                audio_path,
                target_lang: to,
            };
            let socket = daemon_socket(cli.config.as_deref(), socket)?;
            match send_command(&socket, command).await? {
                Response::Pipeline { result } => print_pipeline_result(&result, json)?,
                other => report_response(other),
            }
        }
        Commands::Translate { text, from, to } => {
            let config = load_config(cli.config.as_deref())?;
            let pipeline = build_pipeline(&config)?;
            let result = pipeline.translate_text(&text, &from, &to).await?;
            println!("{}", result.translated_text);
        }
        Commands::Synthesize {
            text,
            language,
            emotion,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let pipeline = build_pipeline(&config)?;
            let speech = pipeline.synthesize(&text, &language, &emotion).await?;
            std::fs::write(&output, &speech)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{} {} ({} bytes)",
                "Wrote".green(),
                output.display(),
                speech.len()
            );
        }
        Commands::Dialect { text } => {
            let config = load_config(cli.config.as_deref())?;
            let pipeline = build_pipeline(&config)?;
            let prediction = pipeline.detect_dialect(&text);
            println!("{} ({:.2})", prediction.dialect, prediction.confidence);
        }
        Commands::Health { socket } => {
            let socket = daemon_socket(cli.config.as_deref(), socket)?;
            handle_ipc_command(&socket, Command::Health).await?;
        }
        Commands::Shutdown { socket } => {
            let socket = daemon_socket(cli.config.as_deref(), socket)?;
            handle_ipc_command(&socket, Command::Shutdown).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "voxbridge", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/voxbridge/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

fn daemon_socket(custom_path: Option<&Path>, socket: Option<PathBuf>) -> Result<PathBuf> {
    let config = load_config(custom_path)?;
    Ok(resolve_socket_path(&config, socket))
}

fn print_pipeline_result(result: &PipelineResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{}", result.translated_text);
    eprintln!(
        "  {} {} → {}",
        "Language:".dimmed(),
        result.detected_language.code(),
        result.target_language.code()
    );
    eprintln!(
        "  {}  {} ({:.2})",
        "Emotion:".dimmed(),
        result.detected_emotion,
        result.emotion_confidence
    );
    if result.detected_language == Language::Te {
        eprintln!("  {}  {}", "Dialect:".dimmed(), result.detected_dialect);
    }
    eprintln!("  {}    {}", "Audio:".dimmed(), result.audio_path.display());
    eprintln!("  {}  {} ms", "Latency:".dimmed(), result.latency_ms);
    Ok(())
}

/// Print any daemon response that carries no pipeline result.
fn report_response(response: Response) {
    match response {
        Response::Ok => println!("{}", "OK".green()),
        Response::Health { report } => {
            let state = if report.is_ready() {
                "ready".green().to_string()
            } else {
                "degraded".yellow().to_string()
            };
            println!("Daemon {} ({})", state, voxbridge::version_string());
            println!("  {} {}", "Transcriber:".dimmed(), report.transcriber);
            println!("  {}  {}", "Emotion:".dimmed(), report.audio_emotion);
            if let Some(text) = report.text_emotion {
                println!("  {}  {}", "Text emotion:".dimmed(), text);
            }
            println!("  {}  {}", "Translator:".dimmed(), report.translator);
            if report.synthesis_engines.is_empty() {
                println!("  {}      disabled", "Voice:".dimmed());
            } else {
                println!(
                    "  {}      {}",
                    "Voice:".dimmed(),
                    report.synthesis_engines.join(", ")
                );
            }
        }
        Response::Error { kind, message } => {
            eprintln!("{} {:?}: {}", "Error".red(), kind, message);
            std::process::exit(1);
        }
        other => match other.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", "Error".red(), e),
        },
    }
}

/// Send IPC command to daemon and handle response.
async fn handle_ipc_command(socket: &Path, command: Command) -> Result<()> {
    match send_command(socket, command).await {
        Ok(response) => report_response(response),
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            eprintln!("Is the daemon running? Start it with: voxbridge serve");
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    let config_path = custom_path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Dump => {
            print!("{}", toml::to_string_pretty(&Config::default())?);
        }
        ConfigAction::Check => {
            let config = load_config(custom_path)?;
            config.validate()?;
            println!("{} {}", "Valid:".green(), config_path.display());
        }
    }
    Ok(())
}
