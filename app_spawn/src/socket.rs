//! Socket-backed spawner client
//!
//! Each start request opens the daemon connection if needed, writes one
//! framed [`AppSpawnStartMsg`], reads one framed [`AppSpawnReply`] and
//! closes the connection again. Failed attempts are retried up to the
//! configured count; validation failures are never retried.

use crate::{AppSpawnClient, AppSpawnReply, AppSpawnStartMsg, SpawnConnectionState, SpawnError};
use core_types::ProcessId;
use ipc::{Parcel, Parcelable};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Extra attempts made after a failed start request
pub const DEFAULT_CONNECT_RETRIES: u32 = 1;

/// Largest reply frame accepted from the daemon
pub const MAX_REPLY_LEN: usize = 1024;

/// Byte transport to the spawner daemon
pub trait SpawnSocket: Send {
    fn open(&mut self) -> Result<(), SpawnError>;
    fn close(&mut self);
    fn write_message(&mut self, bytes: &[u8]) -> Result<(), SpawnError>;
    fn read_message(&mut self) -> Result<Vec<u8>, SpawnError>;
}

struct SocketState<S> {
    socket: S,
    state: SpawnConnectionState,
}

impl<S: SpawnSocket> SocketState<S> {
    fn open(&mut self) -> Result<(), SpawnError> {
        if self.state == SpawnConnectionState::Connected {
            return Ok(());
        }
        match self.socket.open() {
            Ok(()) => {
                self.state = SpawnConnectionState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = SpawnConnectionState::ConnectFailed;
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        if self.state == SpawnConnectionState::Connected {
            self.socket.close();
        }
        self.state = SpawnConnectionState::NotConnected;
    }

    fn request(&mut self, frame: &[u8]) -> Result<ProcessId, SpawnError> {
        self.open()?;
        let reply = self
            .socket
            .write_message(frame)
            .and_then(|()| self.socket.read_message());
        self.close();

        let mut parcel = Parcel::from_bytes(reply?);
        AppSpawnReply::unmarshal(&mut parcel)?.into_pid()
    }
}

/// [`AppSpawnClient`] speaking the daemon protocol over a [`SpawnSocket`]
pub struct SocketSpawnClient<S: SpawnSocket> {
    inner: Mutex<SocketState<S>>,
    retries: u32,
}

impl<S: SpawnSocket> SocketSpawnClient<S> {
    pub fn new(socket: S) -> Self {
        Self {
            inner: Mutex::new(SocketState {
                socket,
                state: SpawnConnectionState::NotConnected,
            }),
            retries: DEFAULT_CONNECT_RETRIES,
        }
    }

    /// Sets how many times a failed request is retried
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Runs `f` against the underlying socket
    pub fn with_socket<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.lock().socket)
    }
}

impl<S: SpawnSocket> AppSpawnClient for SocketSpawnClient<S> {
    fn open_connection(&self) -> Result<(), SpawnError> {
        self.inner.lock().open()
    }

    fn close_connection(&self) {
        self.inner.lock().close();
    }

    fn connection_state(&self) -> SpawnConnectionState {
        self.inner.lock().state
    }

    fn start_process(&self, msg: &AppSpawnStartMsg) -> Result<ProcessId, SpawnError> {
        msg.validate()?;

        let mut frame = Parcel::new();
        msg.marshal(&mut frame)
            .map_err(|err| SpawnError::InvalidMessage(err.to_string()))?;

        let mut inner = self.inner.lock();
        let mut attempt = 0;
        loop {
            match inner.request(frame.as_bytes()) {
                Ok(pid) => {
                    debug!(proc_name = %msg.proc_name, %pid, "spawner created process");
                    return Ok(pid);
                }
                Err(err) if attempt < self.retries => {
                    warn!(proc_name = %msg.proc_name, attempt, error = %err, "spawn attempt failed, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(unix)]
pub use unix::UnixSpawnSocket;

#[cfg(unix)]
mod unix {
    use super::{SpawnSocket, MAX_REPLY_LEN};
    use crate::SpawnError;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Unix domain socket to the spawner daemon
    ///
    /// Frames are a little-endian `u32` length followed by the payload.
    pub struct UnixSpawnSocket {
        path: PathBuf,
        timeout: Option<Duration>,
        stream: Option<UnixStream>,
    }

    impl UnixSpawnSocket {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                timeout: None,
                stream: None,
            }
        }

        /// Bounds every read and write
        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = Some(timeout);
            self
        }

        fn stream(&mut self) -> Result<&mut UnixStream, SpawnError> {
            self.stream
                .as_mut()
                .ok_or_else(|| SpawnError::WriteFailed("socket is not open".to_string()))
        }
    }

    impl SpawnSocket for UnixSpawnSocket {
        fn open(&mut self) -> Result<(), SpawnError> {
            let stream = UnixStream::connect(&self.path).map_err(|e| {
                SpawnError::ConnectFailed(format!("{}: {}", self.path.display(), e))
            })?;
            stream
                .set_read_timeout(self.timeout)
                .and_then(|()| stream.set_write_timeout(self.timeout))
                .map_err(|e| SpawnError::ConnectFailed(e.to_string()))?;
            self.stream = Some(stream);
            Ok(())
        }

        fn close(&mut self) {
            self.stream = None;
        }

        fn write_message(&mut self, bytes: &[u8]) -> Result<(), SpawnError> {
            let stream = self.stream()?;
            let len = (bytes.len() as u32).to_le_bytes();
            stream
                .write_all(&len)
                .and_then(|()| stream.write_all(bytes))
                .and_then(|()| stream.flush())
                .map_err(|e| SpawnError::WriteFailed(e.to_string()))
        }

        fn read_message(&mut self) -> Result<Vec<u8>, SpawnError> {
            let stream = self
                .stream
                .as_mut()
                .ok_or_else(|| SpawnError::ReadFailed("socket is not open".to_string()))?;
            let mut len = [0u8; 4];
            stream
                .read_exact(&mut len)
                .map_err(|e| SpawnError::ReadFailed(e.to_string()))?;
            let len = u32::from_le_bytes(len) as usize;
            if len > MAX_REPLY_LEN {
                return Err(SpawnError::ReadFailed(format!("reply of {} bytes", len)));
            }
            let mut payload = vec![0u8; len];
            stream
                .read_exact(&mut payload)
                .map_err(|e| SpawnError::ReadFailed(e.to_string()))?;
            Ok(payload)
        }
    }
}
