//! Daemon mode: load adapters once, serve IPC until shutdown.

pub mod handler;

use crate::backend::SystemCommandRunner;
use crate::config::Config;
use crate::error::Result;
use crate::ipc::server::IpcServer;
use crate::pipeline::{Pipeline, PipelineSettings, ServiceContext};
use std::path::PathBuf;
use std::sync::Arc;

/// Build the pipeline described by `config`.
///
/// Slow when a native model is configured; call once per process.
pub fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let runner = Arc::new(SystemCommandRunner::new());
    let context = ServiceContext::from_config(config, runner)?;
    let pipeline = Pipeline::new(context, PipelineSettings::from(config));
    pipeline.store().ensure_dir()?;
    Ok(pipeline)
}

/// Socket path: explicit argument, then config, then the per-user default.
pub fn resolve_socket_path(config: &Config, socket_path: Option<PathBuf>) -> PathBuf {
    socket_path
        .or_else(|| config.ipc.socket.clone())
        .unwrap_or_else(IpcServer::default_socket_path)
}

/// Run the daemon: load adapters, start IPC server, wait for shutdown.
///
/// Shutdown comes from SIGINT, SIGTERM or a `shutdown` command.
pub async fn run_daemon(config: Config, socket_path: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    tracing::info!("Loading model adapters");
    let pipeline = Arc::new(build_pipeline(&config)?);
    let health = pipeline.health();
    tracing::info!(
        transcriber = %health.transcriber,
        translator = %health.translator,
        engines = ?health.synthesis_engines,
        "Adapters loaded"
    );

    let socket_path = resolve_socket_path(&config, socket_path);
    let server = Arc::new(IpcServer::new(socket_path)?);
    let handler = handler::DaemonCommandHandler::new(pipeline, server.shutdown_signal());

    let server_clone = Arc::clone(&server);
    let mut server_handle = tokio::spawn(async move { server_clone.start(handler).await });

    tracing::info!(socket = %server.socket_path().display(), "Daemon ready");

    let mut server_finished = false;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, shutting down");
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Error setting up signal handler");
            }
            tracing::info!("Received SIGTERM, shutting down");
        }
        res = &mut server_handle => {
            server_finished = true;
            match res {
                Ok(Ok(())) => tracing::info!("IPC server stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "IPC server failed"),
                Err(e) => tracing::error!(error = %e, "IPC server task panicked"),
            }
        }
    }

    server.stop().await?;

    if !server_finished && let Err(e) = server_handle.await {
        tracing::error!(error = %e, "Daemon server task failed");
    }

    tracing::info!("Daemon stopped");
    Ok(())
}

/// Wait for SIGTERM signal (used by service managers).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_pipeline_creates_outputs_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.pipeline.outputs_dir = dir.path().join("out");

        let pipeline = build_pipeline(&config).unwrap();

        assert!(dir.path().join("out").is_dir());
        assert_eq!(pipeline.health().transcriber, "placeholder");
    }

    #[test]
    fn test_socket_path_precedence() {
        let mut config = Config::default();
        assert_eq!(
            resolve_socket_path(&config, None),
            IpcServer::default_socket_path()
        );

        config.ipc.socket = Some(PathBuf::from("/run/cfg.sock"));
        assert_eq!(
            resolve_socket_path(&config, None),
            PathBuf::from("/run/cfg.sock")
        );
        assert_eq!(
            resolve_socket_path(&config, Some(PathBuf::from("/run/arg.sock"))),
            PathBuf::from("/run/arg.sock")
        );
    }

    #[tokio::test]
    async fn test_shutdown_command_stops_daemon() {
        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        let mut config = Config::default();
        config.pipeline.outputs_dir = dir.path().join("out");

        let daemon = tokio::spawn(run_daemon(config, Some(socket_path.clone())));
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let response = crate::ipc::send_command(&socket_path, crate::ipc::Command::Shutdown)
            .await
            .unwrap();
        assert_eq!(response, crate::ipc::Response::Ok);

        let result = tokio::time::timeout(tokio::time::Duration::from_secs(2), daemon)
            .await
            .expect("daemon should stop after shutdown command")
            .unwrap();
        assert!(result.is_ok());
        assert!(!socket_path.exists());
    }
}
