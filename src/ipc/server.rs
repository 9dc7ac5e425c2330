//! Async Unix socket IPC server for the daemon.

use crate::error::{ErrorKind, Result, VoxbridgeError};
use crate::ipc::protocol::{Command, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;

/// Handler trait for processing IPC commands.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle a command and return a response.
    async fn handle(&self, command: Command) -> Response;
}

/// Shared flag that stops the accept loop.
///
/// Cloned into handlers so a `shutdown` command can stop the server.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<Mutex<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_requested(&self) -> bool {
        *self.requested.lock().await
    }

    pub async fn request(&self) {
        *self.requested.lock().await = true;
    }
}

/// IPC server for daemon commands via Unix socket.
pub struct IpcServer {
    socket_path: PathBuf,
    shutdown: ShutdownSignal,
}

impl IpcServer {
    /// Create a new IPC server bound to the specified socket path.
    pub fn new(socket_path: PathBuf) -> Result<Self> {
        Ok(Self {
            socket_path,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Get the socket path this server is using.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Default socket path: `$XDG_RUNTIME_DIR/voxbridge.sock`, else
    /// `/tmp/voxbridge-<uid>.sock`.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("voxbridge.sock")
        } else {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/tmp/voxbridge-{}.sock", uid))
        }
    }

    /// Start the IPC server and handle incoming connections.
    ///
    /// Returns once shutdown is requested.
    pub async fn start<H>(&self, handler: H) -> Result<()>
    where
        H: CommandHandler + 'static,
    {
        // Clean up any existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| VoxbridgeError::IpcSocket {
                message: format!("Failed to remove existing socket: {}", e),
            })?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| VoxbridgeError::IpcSocket {
                message: format!("Failed to bind to socket: {}", e),
            })?;
        tracing::info!(socket = %self.socket_path.display(), "IPC server listening");

        let handler = Arc::new(handler);

        loop {
            if self.shutdown.is_requested().await {
                tracing::debug!("Shutdown requested, leaving accept loop");
                break;
            }

            // Accept with timeout so the shutdown flag is polled
            let accept_result =
                tokio::time::timeout(tokio::time::Duration::from_millis(100), listener.accept())
                    .await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, handler).await {
                            tracing::warn!(error = %e, "Error handling client");
                        }
                    });
                }
                Ok(Err(e)) => {
                    return Err(VoxbridgeError::IpcConnection {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => continue,
            }
        }

        Ok(())
    }

    /// Stop the IPC server and clean up the socket file.
    pub async fn stop(&self) -> Result<()> {
        self.shutdown.request().await;

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| VoxbridgeError::IpcSocket {
                message: format!("Failed to remove socket file: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Handle a single client connection.
async fn handle_client<H>(stream: UnixStream, handler: Arc<H>) -> Result<()>
where
    H: CommandHandler,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    reader
        .read_line(&mut line)
        .await
        .map_err(|e| VoxbridgeError::IpcConnection {
            message: format!("Failed to read from client: {}", e),
        })?;

    let response = match Command::from_json(line.trim()) {
        Ok(command) => {
            tracing::debug!(command = ?command, "Received command");
            handler.handle(command).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed command");
            Response::Error {
                kind: ErrorKind::InvalidInput,
                message: format!("Failed to parse command: {}", e),
            }
        }
    };

    let response_json = response.to_json().map_err(|e| VoxbridgeError::IpcProtocol {
        message: format!("Failed to serialize response: {}", e),
    })?;

    writer
        .write_all(response_json.as_bytes())
        .await
        .map_err(|e| VoxbridgeError::IpcConnection {
            message: format!("Failed to write to client: {}", e),
        })?;

    writer
        .write_all(b"\n")
        .await
        .map_err(|e| VoxbridgeError::IpcConnection {
            message: format!("Failed to write newline to client: {}", e),
        })?;

    writer
        .flush()
        .await
        .map_err(|e| VoxbridgeError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;

    Ok(())
}
