//! Scheduler test double that records every command

use crate::{AppLaunchData, AppScheduler, SchedulerCommand};
use core_types::{AbilityInfo, AbilityToken};
use parking_lot::Mutex;
use std::sync::Arc;

/// [`AppScheduler`] that keeps an ordered log of received commands
///
/// Clones share the same log, so a test can keep one handle while the
/// manager owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    log: Arc<Mutex<Vec<SchedulerCommand>>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all commands, oldest first
    pub fn commands(&self) -> Vec<SchedulerCommand> {
        self.log.lock().clone()
    }

    /// Number of commands with the given wire code
    pub fn count(&self, code: u32) -> usize {
        self.log.lock().iter().filter(|c| c.code() == code).count()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    fn record(&self, command: SchedulerCommand) {
        self.log.lock().push(command);
    }
}

impl AppScheduler for RecordingScheduler {
    fn schedule_launch_application(&self, data: &AppLaunchData) {
        self.record(SchedulerCommand::LaunchApplication(data.clone()));
    }

    fn schedule_launch_ability(&self, info: &AbilityInfo, token: AbilityToken) {
        self.record(SchedulerCommand::LaunchAbility {
            info: info.clone(),
            token,
        });
    }

    fn schedule_foreground_application(&self) {
        self.record(SchedulerCommand::ForegroundApplication);
    }

    fn schedule_background_application(&self) {
        self.record(SchedulerCommand::BackgroundApplication);
    }

    fn schedule_terminate_application(&self) {
        self.record(SchedulerCommand::TerminateApplication);
    }

    fn schedule_clean_ability(&self, token: AbilityToken) {
        self.record(SchedulerCommand::CleanAbility(token));
    }

    fn schedule_shrink_memory(&self, level: i32) {
        self.record(SchedulerCommand::ShrinkMemory(level));
    }

    fn schedule_low_memory(&self) {
        self.record(SchedulerCommand::LowMemory);
    }
}
