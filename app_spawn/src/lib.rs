//! # App Spawn
//!
//! Client side of the process spawner.
//!
//! ## Philosophy
//!
//! Process creation is an explicit request to a privileged daemon, not a
//! `fork()` of the manager. The manager depends only on the
//! [`AppSpawnClient`] trait:
//! - [`SocketSpawnClient`] speaks the daemon protocol over a [`SpawnSocket`]
//! - [`SimulatedSpawner`] hands out pids in memory for tests
//!
//! Requests are validated locally before anything is written, and every
//! failure surfaces as a [`SpawnError`].

pub mod client;
pub mod error;
pub mod message;
pub mod sim;
pub mod socket;

pub use client::{AppSpawnClient, SpawnConnectionState};
pub use error::SpawnError;
pub use message::{
    AppSpawnReply, AppSpawnStartMsg, MAX_GIDS, MAX_PROC_NAME_LEN, MAX_SO_PATH_LEN,
};
pub use sim::{SimulatedSpawner, FIRST_SIMULATED_PID};
pub use socket::{SocketSpawnClient, SpawnSocket, DEFAULT_CONNECT_RETRIES, MAX_REPLY_LEN};

#[cfg(unix)]
pub use socket::UnixSpawnSocket;
