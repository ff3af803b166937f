//! Process-side dispatch of received scheduler commands

use crate::{AppScheduler, SchedulerCommand, SchedulerError, SchedulerTransport};
use ipc::Parcel;
use tracing::debug;

/// Decodes `(code, parcel)` requests and calls the local scheduler
pub struct SchedulerStub<S: AppScheduler> {
    scheduler: S,
}

impl<S: AppScheduler> SchedulerStub<S> {
    pub fn new(scheduler: S) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Handles one inbound request
    pub fn on_remote_request(&self, code: u32, data: &mut Parcel) -> Result<(), SchedulerError> {
        let command = SchedulerCommand::decode(code, data)?;
        debug!(code, "dispatching scheduler command");
        command.deliver(&self.scheduler);
        Ok(())
    }
}

/// Transport that hands requests straight to an in-process stub
pub struct LoopbackTransport<S: AppScheduler> {
    stub: SchedulerStub<S>,
    connected: bool,
}

impl<S: AppScheduler> LoopbackTransport<S> {
    pub fn new(stub: SchedulerStub<S>) -> Self {
        Self {
            stub,
            connected: true,
        }
    }

    /// Simulates the remote process going away
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn stub(&self) -> &SchedulerStub<S> {
        &self.stub
    }
}

impl<S: AppScheduler> SchedulerTransport for LoopbackTransport<S> {
    fn send_one_way(&mut self, code: u32, data: Parcel) -> Result<(), SchedulerError> {
        if !self.connected {
            return Err(SchedulerError::Disconnected);
        }
        // Decode from the raw bytes, as a real peer would.
        let mut received = Parcel::from_bytes(data.into_bytes());
        self.stub.on_remote_request(code, &mut received)
    }
}
