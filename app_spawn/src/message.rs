//! Start request and reply exchanged with the spawner daemon

use crate::SpawnError;
use core_types::ProcessId;
use ipc::{Parcel, ParcelError, Parcelable};
use serde::{Deserialize, Serialize};

/// Longest process name the daemon accepts, in bytes
pub const MAX_PROC_NAME_LEN: usize = 256;

/// Longest entry library path the daemon accepts, in bytes
pub const MAX_SO_PATH_LEN: usize = 256;

/// Most supplementary groups a process may receive
pub const MAX_GIDS: usize = 64;

/// Description of the process the daemon should fork
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpawnStartMsg {
    pub uid: i32,
    pub gid: i32,
    pub gids: Vec<i32>,
    pub proc_name: String,
    pub so_path: String,
}

impl AppSpawnStartMsg {
    /// Creates a request with `gid == uid` and no supplementary groups
    pub fn new(uid: i32, proc_name: impl Into<String>, so_path: impl Into<String>) -> Self {
        Self {
            uid,
            gid: uid,
            gids: Vec::new(),
            proc_name: proc_name.into(),
            so_path: so_path.into(),
        }
    }

    /// Sets the supplementary groups
    pub fn with_gids(mut self, gids: Vec<i32>) -> Self {
        self.gids = gids;
        self
    }

    /// Checks the fields against the daemon's limits
    pub fn validate(&self) -> Result<(), SpawnError> {
        if self.proc_name.is_empty() {
            return Err(SpawnError::InvalidMessage("empty process name".to_string()));
        }
        if self.proc_name.len() >= MAX_PROC_NAME_LEN {
            return Err(SpawnError::InvalidMessage(format!(
                "process name is {} bytes",
                self.proc_name.len()
            )));
        }
        if self.so_path.is_empty() {
            return Err(SpawnError::InvalidMessage("empty library path".to_string()));
        }
        if self.so_path.len() >= MAX_SO_PATH_LEN {
            return Err(SpawnError::InvalidMessage(format!(
                "library path is {} bytes",
                self.so_path.len()
            )));
        }
        if self.gids.len() > MAX_GIDS {
            return Err(SpawnError::InvalidMessage(format!(
                "{} supplementary groups",
                self.gids.len()
            )));
        }
        Ok(())
    }
}

impl Parcelable for AppSpawnStartMsg {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_i32(self.uid);
        parcel.write_i32(self.gid);
        parcel.write_len(self.gids.len())?;
        for gid in &self.gids {
            parcel.write_i32(*gid);
        }
        parcel.write_string(&self.proc_name)?;
        parcel.write_string(&self.so_path)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let uid = parcel.read_i32()?;
        let gid = parcel.read_i32()?;
        let count = parcel.read_i32()?;
        let count = usize::try_from(count)
            .ok()
            .filter(|c| *c <= MAX_GIDS)
            .ok_or(ParcelError::InvalidLength(count))?;
        let gids = (0..count)
            .map(|_| parcel.read_i32())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            uid,
            gid,
            gids,
            proc_name: parcel.read_string()?,
            so_path: parcel.read_string()?,
        })
    }
}

/// Daemon answer to a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSpawnReply {
    /// Zero on success, daemon specific code otherwise
    pub result: i32,
    pub pid: i32,
}

impl AppSpawnReply {
    /// Converts the reply into a spawned pid
    pub fn into_pid(self) -> Result<ProcessId, SpawnError> {
        if self.result != 0 {
            return Err(SpawnError::Rejected(self.result));
        }
        let pid = ProcessId::new(self.pid);
        if !pid.is_valid() {
            return Err(SpawnError::InvalidPid(self.pid));
        }
        Ok(pid)
    }
}

impl Parcelable for AppSpawnReply {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_i32(self.result);
        parcel.write_i32(self.pid);
        Ok(())
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            result: parcel.read_i32()?,
            pid: parcel.read_i32()?,
        })
    }
}
