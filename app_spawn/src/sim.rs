//! Simulated spawner for tests and host-side runs
//!
//! Hands out increasing pids without creating real processes. Individual
//! results can be scripted to exercise failure paths.

use crate::{AppSpawnClient, AppSpawnStartMsg, SpawnConnectionState, SpawnError};
use core_types::ProcessId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// First pid handed out when nothing is scripted
pub const FIRST_SIMULATED_PID: i32 = 1000;

struct SimState {
    next_pid: i32,
    scripted: VecDeque<Result<ProcessId, SpawnError>>,
    requests: Vec<AppSpawnStartMsg>,
    state: SpawnConnectionState,
    fail_connect: bool,
}

/// In-memory [`AppSpawnClient`]
pub struct SimulatedSpawner {
    state: Mutex<SimState>,
}

impl SimulatedSpawner {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                next_pid: FIRST_SIMULATED_PID,
                scripted: VecDeque::new(),
                requests: Vec::new(),
                state: SpawnConnectionState::NotConnected,
                fail_connect: false,
            }),
        }
    }

    /// Queues the result of a future `start_process` call
    pub fn push_result(&self, result: Result<ProcessId, SpawnError>) {
        self.state.lock().scripted.push_back(result);
    }

    /// Queues a failing `start_process` call
    pub fn push_failure(&self, code: i32) {
        self.push_result(Err(SpawnError::Rejected(code)));
    }

    /// Makes `open_connection` fail until cleared
    pub fn set_connect_failure(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    /// Number of `start_process` calls so far
    pub fn call_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Every request received, oldest first
    pub fn requests(&self) -> Vec<AppSpawnStartMsg> {
        self.state.lock().requests.clone()
    }
}

impl Default for SimulatedSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl AppSpawnClient for SimulatedSpawner {
    fn open_connection(&self) -> Result<(), SpawnError> {
        let mut state = self.state.lock();
        if state.fail_connect {
            state.state = SpawnConnectionState::ConnectFailed;
            return Err(SpawnError::ConnectFailed("simulated".to_string()));
        }
        state.state = SpawnConnectionState::Connected;
        Ok(())
    }

    fn close_connection(&self) {
        self.state.lock().state = SpawnConnectionState::NotConnected;
    }

    fn connection_state(&self) -> SpawnConnectionState {
        self.state.lock().state
    }

    fn start_process(&self, msg: &AppSpawnStartMsg) -> Result<ProcessId, SpawnError> {
        let mut state = self.state.lock();
        state.requests.push(msg.clone());

        let result = match state.scripted.pop_front() {
            Some(result) => result,
            None => {
                msg.validate()?;
                let pid = ProcessId::new(state.next_pid);
                state.next_pid += 1;
                Ok(pid)
            }
        };
        debug!(proc_name = %msg.proc_name, ?result, "simulated spawn");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(name: &str) -> AppSpawnStartMsg {
        AppSpawnStartMsg::new(0, name, "libentry.so")
    }

    #[test]
    fn test_sequential_pids() {
        let spawner = SimulatedSpawner::new();
        let a = spawner.start_process(&msg("a")).unwrap();
        let b = spawner.start_process(&msg("b")).unwrap();

        assert_eq!(a, ProcessId::new(FIRST_SIMULATED_PID));
        assert_eq!(b, ProcessId::new(FIRST_SIMULATED_PID + 1));
        assert_eq!(spawner.call_count(), 2);
        assert_eq!(spawner.requests()[1].proc_name, "b");
    }

    #[test]
    fn test_scripted_results() {
        let spawner = SimulatedSpawner::new();
        spawner.push_failure(-1);
        spawner.push_result(Ok(ProcessId::new(4242)));

        assert_eq!(spawner.start_process(&msg("a")), Err(SpawnError::Rejected(-1)));
        assert_eq!(spawner.start_process(&msg("a")), Ok(ProcessId::new(4242)));
        assert_eq!(
            spawner.start_process(&msg("a")),
            Ok(ProcessId::new(FIRST_SIMULATED_PID))
        );
    }

    #[test]
    fn test_connection_state() {
        let spawner = SimulatedSpawner::new();
        assert_eq!(spawner.connection_state(), SpawnConnectionState::NotConnected);

        spawner.open_connection().unwrap();
        assert_eq!(spawner.connection_state(), SpawnConnectionState::Connected);

        spawner.close_connection();
        spawner.set_connect_failure(true);
        assert!(spawner.open_connection().is_err());
        assert_eq!(spawner.connection_state(), SpawnConnectionState::ConnectFailed);
    }

    #[test]
    fn test_invalid_request_counted_but_rejected() {
        let spawner = SimulatedSpawner::new();
        assert!(spawner.start_process(&msg("")).is_err());
        assert_eq!(spawner.call_count(), 1);
    }
}
