//! Runtime state of one application process
//!
//! An [`AppRunningRecord`] owns its abilities in insertion order, the
//! optional scheduler connection of its process, and the process pid once
//! the spawner reported success. All mutation goes through the manager;
//! commands and notifications are queued on an [`Outbox`].

use crate::ability_record::{AbilityRunningRecord, SchedulingHints};
use crate::callback::AppProcessData;
use crate::outbox::Outbox;
use crate::transition::{ability_transition, app_transition, AbilityEvent, AbilityTransition, AppEvent};
use crate::AppMgrError;
use app_scheduler::{AppLaunchData, AppScheduler, SchedulerCommand};
use core_types::{
    AbilityInfo, AbilityState, AbilityToken, AppRecordId, ApplicationInfo, ApplicationState,
    ProcessId,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of [`AppRunningRecord::add_ability`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddAbilityOutcome {
    /// A new ability record was registered
    Added(AbilityToken),
    /// A singleton with the same name already runs here; nothing was added
    ExistingSingleton(AbilityToken),
}

impl AddAbilityOutcome {
    pub fn token(&self) -> AbilityToken {
        match self {
            AddAbilityOutcome::Added(token) | AddAbilityOutcome::ExistingSingleton(token) => *token,
        }
    }
}

/// An application process tracked by the manager
#[derive(Clone)]
pub struct AppRunningRecord {
    record_id: AppRecordId,
    app_info: ApplicationInfo,
    process_name: String,
    uid: i32,
    state: ApplicationState,
    abilities: Vec<AbilityRunningRecord>,
    scheduler: Option<Arc<dyn AppScheduler>>,
    pid: Option<ProcessId>,
    foregrounding: Vec<AbilityToken>,
}

impl AppRunningRecord {
    /// Creates a record in [`ApplicationState::Create`]
    pub fn new(
        record_id: AppRecordId,
        app_info: ApplicationInfo,
        process_name: impl Into<String>,
        uid: i32,
    ) -> Self {
        Self {
            record_id,
            app_info,
            process_name: process_name.into(),
            uid,
            state: ApplicationState::Create,
            abilities: Vec::new(),
            scheduler: None,
            pid: None,
            foregrounding: Vec::new(),
        }
    }

    pub fn record_id(&self) -> AppRecordId {
        self.record_id
    }

    /// Application name
    pub fn name(&self) -> &str {
        &self.app_info.name
    }

    pub fn bundle_name(&self) -> &str {
        &self.app_info.bundle_name
    }

    pub fn app_info(&self) -> &ApplicationInfo {
        &self.app_info
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn uid(&self) -> i32 {
        self.uid
    }

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    pub fn pid(&self) -> Option<ProcessId> {
        self.pid
    }

    pub fn is_scheduler_bound(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Abilities in registration order
    pub fn abilities(&self) -> &[AbilityRunningRecord] {
        &self.abilities
    }

    pub fn ability(&self, token: AbilityToken) -> Option<&AbilityRunningRecord> {
        self.abilities.iter().find(|a| a.token() == token)
    }

    pub fn ability_by_name(&self, name: &str) -> Option<&AbilityRunningRecord> {
        self.abilities.iter().find(|a| a.name() == name)
    }

    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    /// Abilities waiting for the application to reach the foreground
    pub fn foregrounding_abilities(&self) -> &[AbilityToken] {
        &self.foregrounding
    }

    /// Observer payload for the current state
    pub fn process_data(&self) -> AppProcessData {
        self.process_data_with(self.state)
    }

    pub(crate) fn process_data_with(&self, state: ApplicationState) -> AppProcessData {
        AppProcessData {
            record_id: self.record_id,
            app_name: self.app_info.name.clone(),
            process_name: self.process_name.clone(),
            pid: self.pid,
            state,
        }
    }

    /// Termination removes the record, so `End` and `Terminated` are never stored
    pub(crate) fn set_state(&mut self, state: ApplicationState) {
        if matches!(state, ApplicationState::End | ApplicationState::Terminated) {
            return;
        }
        self.state = state;
    }

    pub(crate) fn set_pid(&mut self, pid: ProcessId) {
        self.pid = Some(pid);
    }

    pub(crate) fn bind_scheduler(&mut self, scheduler: Arc<dyn AppScheduler>) {
        self.scheduler = Some(scheduler);
    }

    fn ability_mut(&mut self, token: AbilityToken) -> Option<&mut AbilityRunningRecord> {
        self.abilities.iter_mut().find(|a| a.token() == token)
    }

    fn send(&self, outbox: &mut Outbox, command: SchedulerCommand) -> bool {
        match &self.scheduler {
            Some(scheduler) => {
                outbox.command(scheduler, command);
                true
            }
            None => {
                debug!(record_id = %self.record_id, code = command.code(), "no scheduler bound, command skipped");
                false
            }
        }
    }

    /// Registers an ability under `token`
    pub(crate) fn add_ability(
        &mut self,
        token: Option<AbilityToken>,
        info: Option<&AbilityInfo>,
    ) -> Result<AddAbilityOutcome, AppMgrError> {
        let token = token.ok_or(AppMgrError::InvalidArgument("token"))?;
        let info = info.ok_or(AppMgrError::InvalidArgument("ability info"))?;

        if self.ability(token).is_some() {
            return Err(AppMgrError::AlreadyExists(token));
        }
        if info.is_singleton() {
            if let Some(existing) = self.ability_by_name(&info.name) {
                return Ok(AddAbilityOutcome::ExistingSingleton(existing.token()));
            }
        }

        let mut ability = AbilityRunningRecord::new(info.clone(), token);
        ability.set_state(AbilityState::Create);
        self.abilities.push(ability);
        Ok(AddAbilityOutcome::Added(token))
    }

    pub(crate) fn set_ability_pre_token(&mut self, token: AbilityToken, pre_token: Option<AbilityToken>) {
        if let Some(ability) = self.ability_mut(token) {
            ability.set_pre_token(pre_token);
        }
    }

    pub(crate) fn set_ability_hints(&mut self, token: AbilityToken, hints: SchedulingHints) -> bool {
        match self.ability_mut(token) {
            Some(ability) => {
                ability.set_hints(hints);
                true
            }
            None => false,
        }
    }

    /// Launches the application in its freshly attached process
    ///
    /// Only legal from `Create` with a bound scheduler. Abilities that were
    /// registered while the process was starting are launched afterwards.
    pub(crate) fn launch_application(&mut self, outbox: &mut Outbox) -> bool {
        let Some(next) = app_transition(self.state, AppEvent::Launch) else {
            debug!(record_id = %self.record_id, state = %self.state, "launch application rejected");
            return false;
        };
        let data = AppLaunchData {
            app_info: self.app_info.clone(),
            process_name: self.process_name.clone(),
            record_id: self.record_id,
            uid: self.uid,
        };
        if !self.send(outbox, SchedulerCommand::LaunchApplication(data)) {
            return false;
        }
        self.set_state(next);
        outbox.app_state_changed(self.process_data());
        self.launch_pending_abilities(outbox);
        true
    }

    /// Launches every ability still in `Create`
    pub(crate) fn launch_pending_abilities(&mut self, outbox: &mut Outbox) {
        let pending: Vec<AbilityToken> = self
            .abilities
            .iter()
            .filter(|a| a.state() == AbilityState::Create)
            .map(AbilityRunningRecord::token)
            .collect();
        for token in pending {
            self.launch_ability(token, outbox);
        }
    }

    /// Sends the launch command for one ability
    pub(crate) fn launch_ability(&mut self, token: AbilityToken, outbox: &mut Outbox) -> bool {
        let app_state = self.state;
        let Some(ability) = self.ability(token) else {
            return false;
        };
        let Some(AbilityTransition::Apply(next)) =
            ability_transition(ability.state(), AbilityEvent::Launch, app_state)
        else {
            debug!(%token, state = %ability.state(), "launch ability rejected");
            return false;
        };
        let command = SchedulerCommand::LaunchAbility {
            info: ability.info().clone(),
            token,
        };
        if !self.send(outbox, command) {
            return false;
        }
        if let Some(ability) = self.ability_mut(token) {
            ability.set_state(next);
        }
        true
    }

    /// Drives an ability toward `target`
    ///
    /// Returns false when the table has no row for the combination.
    pub(crate) fn update_ability_state(
        &mut self,
        token: AbilityToken,
        target: AbilityState,
        outbox: &mut Outbox,
    ) -> bool {
        let app_state = self.state;
        let Some(current) = self.ability(token).map(AbilityRunningRecord::state) else {
            return false;
        };
        let Some(event) = AbilityEvent::from_target(target) else {
            return false;
        };
        let Some(transition) = ability_transition(current, event, app_state) else {
            warn!(%token, ability = %current, app = %app_state, requested = %target, "ability transition rejected");
            return false;
        };

        match transition {
            AbilityTransition::Apply(next) => {
                if let Some(ability) = self.ability_mut(token) {
                    ability.set_state(next);
                }
                outbox.ability_state_changed(token, next);
                if next == AbilityState::Background {
                    self.background_if_idle(outbox);
                }
            }
            AbilityTransition::AwaitAppForeground => {
                if self.foregrounding.is_empty() {
                    self.send(outbox, SchedulerCommand::ForegroundApplication);
                }
                if !self.foregrounding.contains(&token) {
                    self.foregrounding.push(token);
                }
            }
        }
        true
    }

    fn background_if_idle(&mut self, outbox: &mut Outbox) {
        if self.state != ApplicationState::Foreground {
            return;
        }
        let any_foreground = self
            .abilities
            .iter()
            .any(|a| a.state() == AbilityState::Foreground);
        if !any_foreground {
            self.send(outbox, SchedulerCommand::BackgroundApplication);
        }
    }

    /// The process confirmed it reached the foreground
    ///
    /// Abilities queued on the way are moved first, then the record itself.
    pub(crate) fn application_foregrounded(&mut self, outbox: &mut Outbox) -> bool {
        for token in std::mem::take(&mut self.foregrounding) {
            if let Some(ability) = self.ability_mut(token) {
                ability.set_state(AbilityState::Foreground);
                outbox.ability_state_changed(token, AbilityState::Foreground);
            }
        }
        self.apply_app_event(AppEvent::Foregrounded, outbox)
    }

    /// The process confirmed it reached the background
    pub(crate) fn application_backgrounded(&mut self, outbox: &mut Outbox) -> bool {
        self.apply_app_event(AppEvent::Backgrounded, outbox)
    }

    fn apply_app_event(&mut self, event: AppEvent, outbox: &mut Outbox) -> bool {
        match app_transition(self.state, event) {
            Some(next) => {
                self.set_state(next);
                outbox.app_state_changed(self.process_data());
                true
            }
            None => {
                warn!(record_id = %self.record_id, state = %self.state, ?event, "application transition rejected");
                false
            }
        }
    }

    /// Asks the process to clean up a backgrounded ability
    pub(crate) fn terminate_ability(&mut self, token: AbilityToken, outbox: &mut Outbox) -> bool {
        match self.ability(token).map(AbilityRunningRecord::state) {
            Some(AbilityState::Background) => self.send(outbox, SchedulerCommand::CleanAbility(token)),
            Some(state) => {
                debug!(%token, %state, "terminate ability rejected");
                false
            }
            None => false,
        }
    }

    /// The process finished cleaning an ability
    ///
    /// The last ability leaving also terminates the application.
    pub(crate) fn ability_terminated(&mut self, token: AbilityToken, outbox: &mut Outbox) -> bool {
        if !self.clear_ability(token) {
            return false;
        }
        if self.abilities.is_empty() {
            self.send(outbox, SchedulerCommand::TerminateApplication);
        }
        true
    }

    /// Drops an ability record unconditionally
    pub(crate) fn clear_ability(&mut self, token: AbilityToken) -> bool {
        let before = self.abilities.len();
        self.abilities.retain(|a| a.token() != token);
        self.foregrounding.retain(|t| *t != token);
        self.abilities.len() != before
    }

    pub(crate) fn schedule_terminate(&self, outbox: &mut Outbox) -> bool {
        self.send(outbox, SchedulerCommand::TerminateApplication)
    }

    pub(crate) fn schedule_trim_memory(&self, level: i32, outbox: &mut Outbox) -> bool {
        self.send(outbox, SchedulerCommand::ShrinkMemory(level))
    }

    pub(crate) fn low_memory_warning(&self, outbox: &mut Outbox) -> bool {
        self.send(outbox, SchedulerCommand::LowMemory)
    }
}

impl fmt::Debug for AppRunningRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRunningRecord")
            .field("record_id", &self.record_id)
            .field("app_info", &self.app_info)
            .field("process_name", &self.process_name)
            .field("uid", &self.uid)
            .field("state", &self.state)
            .field("abilities", &self.abilities)
            .field("scheduler_bound", &self.scheduler.is_some())
            .field("pid", &self.pid)
            .field("foregrounding", &self.foregrounding)
            .finish()
    }
}
