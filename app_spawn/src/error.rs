//! Spawner error types

use ipc::ParcelError;
use thiserror::Error;

/// Errors that can occur while asking the spawner daemon for a process
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpawnError {
    /// No spawner connection could be established
    #[error("Failed to connect to spawner: {0}")]
    ConnectFailed(String),

    /// The start message failed validation before it was sent
    #[error("Invalid start message: {0}")]
    InvalidMessage(String),

    /// Writing the request failed
    #[error("Failed to write spawn request: {0}")]
    WriteFailed(String),

    /// Reading the reply failed
    #[error("Failed to read spawn reply: {0}")]
    ReadFailed(String),

    /// The reply could not be decoded
    #[error("Malformed spawn reply: {0}")]
    MalformedReply(#[from] ParcelError),

    /// The daemon refused to create the process
    #[error("Spawner rejected request with code {0}")]
    Rejected(i32),

    /// The daemon reported success with an unusable pid
    #[error("Spawner returned invalid pid {0}")]
    InvalidPid(i32),
}
