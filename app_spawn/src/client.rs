//! The spawner interface consumed by the application manager

use crate::{AppSpawnStartMsg, SpawnError};
use core_types::ProcessId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the connection to the spawner daemon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnConnectionState {
    #[default]
    NotConnected,
    Connected,
    ConnectFailed,
}

impl fmt::Display for SpawnConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpawnConnectionState::NotConnected => "not-connected",
            SpawnConnectionState::Connected => "connected",
            SpawnConnectionState::ConnectFailed => "connect-failed",
        };
        f.write_str(name)
    }
}

/// Creates operating system processes on behalf of the manager
///
/// Implementations:
/// - [`crate::SocketSpawnClient`]: talks to the spawner daemon
/// - [`crate::SimulatedSpawner`]: scripted results for tests
///
/// `start_process` may block; callers must not hold registry locks
/// across it.
pub trait AppSpawnClient: Send + Sync {
    /// Connects to the daemon
    fn open_connection(&self) -> Result<(), SpawnError>;

    /// Drops the connection, if any
    fn close_connection(&self);

    /// Reports the current connection state
    fn connection_state(&self) -> SpawnConnectionState;

    /// Asks the daemon for a new process and returns its pid
    fn start_process(&self, msg: &AppSpawnStartMsg) -> Result<ProcessId, SpawnError>;
}
