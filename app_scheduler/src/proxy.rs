//! IPC-backed scheduler connection

use crate::{AppLaunchData, AppScheduler, SchedulerCommand, SchedulerError};
use core_types::{AbilityInfo, AbilityToken};
use ipc::Parcel;
use parking_lot::Mutex;
use tracing::{trace, warn};

/// Carries encoded commands to a hosted process
pub trait SchedulerTransport: Send {
    /// Sends a one-way request; no reply is read
    fn send_one_way(&mut self, code: u32, data: Parcel) -> Result<(), SchedulerError>;
}

/// [`AppScheduler`] that encodes every command onto a transport
///
/// Commands are fire-and-forget: a transport failure is logged and
/// dropped. A dead process is detected through the manager's death
/// notification, not through send errors.
pub struct AppSchedulerProxy<T: SchedulerTransport> {
    transport: Mutex<T>,
}

impl<T: SchedulerTransport> AppSchedulerProxy<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
        }
    }

    /// Encodes and sends one command, returning the transport result
    pub fn send(&self, command: &SchedulerCommand) -> Result<(), SchedulerError> {
        let (code, data) = command.encode()?;
        trace!(code, bytes = data.len(), "sending scheduler command");
        self.transport.lock().send_one_way(code, data)
    }

    fn post(&self, command: SchedulerCommand) {
        if let Err(err) = self.send(&command) {
            warn!(code = command.code(), error = %err, "scheduler command dropped");
        }
    }
}

impl<T: SchedulerTransport> AppScheduler for AppSchedulerProxy<T> {
    fn schedule_launch_application(&self, data: &AppLaunchData) {
        self.post(SchedulerCommand::LaunchApplication(data.clone()));
    }

    fn schedule_launch_ability(&self, info: &AbilityInfo, token: AbilityToken) {
        self.post(SchedulerCommand::LaunchAbility {
            info: info.clone(),
            token,
        });
    }

    fn schedule_foreground_application(&self) {
        self.post(SchedulerCommand::ForegroundApplication);
    }

    fn schedule_background_application(&self) {
        self.post(SchedulerCommand::BackgroundApplication);
    }

    fn schedule_terminate_application(&self) {
        self.post(SchedulerCommand::TerminateApplication);
    }

    fn schedule_clean_ability(&self, token: AbilityToken) {
        self.post(SchedulerCommand::CleanAbility(token));
    }

    fn schedule_shrink_memory(&self, level: i32) {
        self.post(SchedulerCommand::ShrinkMemory(level));
    }

    fn schedule_low_memory(&self) {
        self.post(SchedulerCommand::LowMemory);
    }
}
