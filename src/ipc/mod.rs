//! Request layer: one JSON command per Unix socket connection.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::send_command;
pub use protocol::{Command, Response};
pub use server::{CommandHandler, IpcServer, ShutdownSignal};
