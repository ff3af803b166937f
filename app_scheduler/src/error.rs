//! Scheduler connection errors

use ipc::ParcelError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Codec error: {0}")]
    Codec(#[from] ParcelError),

    #[error("Unknown scheduler command code: {0}")]
    UnknownCode(u32),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote process is gone")]
    Disconnected,
}
