//! The application manager service
//!
//! [`AppMgrService`] owns the registry of application records and is the
//! only component that mutates them. Every inbound call takes the registry
//! lock once, queues scheduler commands and observer notifications on an
//! outbox, releases the lock, and then delivers the outbox. The spawner is
//! always called without the lock held.

use crate::app_record::AppRunningRecord;
use crate::ability_record::SchedulingHints;
use crate::callback::AppStateCallback;
use crate::outbox::Outbox;
use crate::recent_list::{AppTaskInfo, RecentAppList};
use crate::running_manager::AppRunningManager;
use crate::transition::AbilityEvent;
use crate::{AppMgrConfig, AppMgrError, RecordQueryResult};
use app_scheduler::AppScheduler;
use app_spawn::{AppSpawnClient, AppSpawnStartMsg, SpawnConnectionState};
use core_types::{
    AbilityInfo, AbilityState, AbilityToken, AppRecordId, ApplicationInfo, ApplicationState,
    ProcessId,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Summary of one tracked process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningProcessInfo {
    pub record_id: AppRecordId,
    pub process_name: String,
    pub pid: Option<ProcessId>,
    pub uid: i32,
    pub state: ApplicationState,
}

struct Registry {
    running: AppRunningManager,
    recent: RecentAppList,
}

/// Application lifecycle manager
pub struct AppMgrService {
    config: AppMgrConfig,
    registry: Mutex<Registry>,
    spawner: RwLock<Option<Arc<dyn AppSpawnClient>>>,
    callbacks: RwLock<Vec<Arc<dyn AppStateCallback>>>,
}

impl AppMgrService {
    /// Creates a manager without a spawner
    pub fn new(config: AppMgrConfig) -> Self {
        let recent = RecentAppList::new(config.max_recent_apps);
        Self {
            config,
            registry: Mutex::new(Registry {
                running: AppRunningManager::new(),
                recent,
            }),
            spawner: RwLock::new(None),
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Sets the spawner used for new processes
    pub fn with_spawn_client(self, spawner: Arc<dyn AppSpawnClient>) -> Self {
        *self.spawner.write() = Some(spawner);
        self
    }

    pub fn set_spawn_client(&self, spawner: Option<Arc<dyn AppSpawnClient>>) {
        *self.spawner.write() = spawner;
    }

    pub fn spawn_client(&self) -> Option<Arc<dyn AppSpawnClient>> {
        self.spawner.read().clone()
    }

    pub fn config(&self) -> &AppMgrConfig {
        &self.config
    }

    pub fn register_app_state_callback(&self, callback: Arc<dyn AppStateCallback>) {
        self.callbacks.write().push(callback);
    }

    /// Removes a previously registered observer
    pub fn unregister_app_state_callback(&self, callback: &Arc<dyn AppStateCallback>) -> bool {
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|c| !Arc::ptr_eq(c, callback));
        callbacks.len() != before
    }

    fn flush(&self, outbox: Outbox) {
        if outbox.is_empty() {
            return;
        }
        let observers = self.callbacks.read().clone();
        outbox.deliver(&observers);
    }

    /// Finds or creates the record for `process_name` and registers the
    /// ability under `token`
    pub fn get_or_create_app_running_record(
        &self,
        token: Option<AbilityToken>,
        app_info: Option<&ApplicationInfo>,
        ability_info: Option<&AbilityInfo>,
        process_name: &str,
        uid: i32,
    ) -> Result<RecordQueryResult, AppMgrError> {
        self.registry
            .lock()
            .running
            .get_or_create(token, app_info, ability_info, process_name, uid)
    }

    /// Entry point for a request to run an ability
    ///
    /// Reuses the record of a running (or starting) process when one
    /// exists. Otherwise creates a record and spawns the process; a failed
    /// spawn removes the record again.
    pub fn load_ability(
        &self,
        token: Option<AbilityToken>,
        pre_token: Option<AbilityToken>,
        ability_info: Option<&AbilityInfo>,
        app_info: Option<&ApplicationInfo>,
    ) {
        let (Some(token), Some(ability_info), Some(app_info)) = (token, ability_info, app_info)
        else {
            warn!("load ability: token or descriptor missing");
            return;
        };
        if ability_info.name.is_empty() || app_info.name.is_empty() || app_info.bundle_name.is_empty()
        {
            warn!(%token, "load ability: empty ability, application or bundle name");
            return;
        }
        if ability_info.application_name != app_info.name {
            warn!(
                %token,
                ability_app = %ability_info.application_name,
                app = %app_info.name,
                "load ability: descriptor belongs to another application"
            );
            return;
        }

        let process_name = if ability_info.process.is_empty() {
            app_info.bundle_name.as_str()
        } else {
            ability_info.process.as_str()
        };
        let uid = app_info.uid.unwrap_or(self.config.default_uid);

        let mut outbox = Outbox::new();
        let created = {
            let mut guard = self.registry.lock();
            let running = &mut guard.running;
            match running
                .find_by_process_name(process_name)
                .map(AppRunningRecord::record_id)
            {
                Some(id) => {
                    Self::start_ability_locked(running, token, pre_token, ability_info, id, &mut outbox);
                    None
                }
                None => match running.get_or_create(
                    Some(token),
                    Some(app_info),
                    Some(ability_info),
                    process_name,
                    uid,
                ) {
                    Ok(result) => {
                        if let Some(record) = running.get_mut(result.app_record_id) {
                            record.set_ability_pre_token(token, pre_token);
                        }
                        Some(result.app_record_id)
                    }
                    Err(err) => {
                        warn!(%token, error = %err, "load ability rejected");
                        None
                    }
                },
            }
        };
        self.flush(outbox);

        if let Some(id) = created {
            if let Err(err) = self.start_process(&app_info.name, process_name, Some(id)) {
                warn!(record_id = %id, error = %err, "process not started");
            }
        }
    }

    /// Registers an ability on an existing record and launches it if the
    /// process is already attached
    pub fn start_ability(
        &self,
        token: AbilityToken,
        pre_token: Option<AbilityToken>,
        ability_info: &AbilityInfo,
        app_record_id: Option<AppRecordId>,
    ) {
        let Some(id) = app_record_id else {
            debug!(%token, "start ability without record");
            return;
        };
        let mut outbox = Outbox::new();
        {
            let mut guard = self.registry.lock();
            Self::start_ability_locked(&mut guard.running, token, pre_token, ability_info, id, &mut outbox);
        }
        self.flush(outbox);
    }

    fn start_ability_locked(
        running: &mut AppRunningManager,
        token: AbilityToken,
        pre_token: Option<AbilityToken>,
        ability_info: &AbilityInfo,
        id: AppRecordId,
        outbox: &mut Outbox,
    ) {
        if let Some(owner) = running.find_id_by_token(token) {
            if owner != id {
                warn!(
                    %token,
                    record_id = %id,
                    owner = %owner,
                    "start ability: token held by another process"
                );
                return;
            }
        }
        let Some(record) = running.get_mut(id) else {
            warn!(record_id = %id, "start ability: record not found");
            return;
        };
        if ability_info.is_singleton() && record.ability_by_name(&ability_info.name).is_some() {
            debug!(record_id = %id, ability = %ability_info.name, "singleton already running");
            return;
        }
        if record.ability(token).is_some() {
            if pre_token.is_some() {
                record.set_ability_pre_token(token, pre_token);
            }
            return;
        }
        if let Err(err) = record.add_ability(Some(token), Some(ability_info)) {
            warn!(%token, error = %err, "start ability: add failed");
            return;
        }
        record.set_ability_pre_token(token, pre_token);
        if record.is_scheduler_bound() {
            record.launch_ability(token, outbox);
        }
    }

    /// Spawns the process for a pending record
    ///
    /// On success the pid is stored and the process joins the recent list.
    /// On failure the record is removed from the registry.
    pub fn start_process(
        &self,
        app_name: &str,
        process_name: &str,
        app_record_id: Option<AppRecordId>,
    ) -> Result<ProcessId, AppMgrError> {
        let id = app_record_id.ok_or(AppMgrError::InvalidArgument("application record"))?;
        let spawner = self
            .spawn_client()
            .ok_or_else(|| AppMgrError::NotFound("spawn client".to_string()))?;
        let uid = self
            .registry
            .lock()
            .running
            .get(id)
            .map(AppRunningRecord::uid)
            .ok_or_else(|| AppMgrError::record_not_found(id))?;

        let msg = AppSpawnStartMsg::new(uid, process_name, self.config.so_path.as_str());
        let spawned = spawner.start_process(&msg);

        let mut outbox = Outbox::new();
        let result = {
            let mut guard = self.registry.lock();
            let Registry { running, recent } = &mut *guard;
            match spawned {
                Ok(pid) => match running.get_mut(id) {
                    Some(record) => {
                        record.set_pid(pid);
                        outbox.app_state_changed(record.process_data());
                        recent.add(AppTaskInfo {
                            app_name: app_name.to_string(),
                            process_name: process_name.to_string(),
                            pid,
                            record_id: id,
                        });
                        info!(record_id = %id, %pid, process_name, "process started");
                        Ok(pid)
                    }
                    None => {
                        warn!(record_id = %id, %pid, "record removed while spawning");
                        Err(AppMgrError::record_not_found(id))
                    }
                },
                Err(err) => {
                    error!(record_id = %id, process_name, error = %err, "spawn failed, dropping record");
                    running.remove(id);
                    recent.remove_by_id(id);
                    Err(AppMgrError::SpawnFailed(err))
                }
            }
        };
        self.flush(outbox);
        result
    }

    /// A spawned process reports in with its scheduler connection
    pub fn attach_application(&self, pid: ProcessId, scheduler: Option<Arc<dyn AppScheduler>>) {
        if !pid.is_valid() {
            warn!(%pid, "attach with invalid pid");
            return;
        }
        let Some(scheduler) = scheduler else {
            warn!(%pid, "attach without scheduler");
            return;
        };

        let mut outbox = Outbox::new();
        {
            let mut guard = self.registry.lock();
            let running = &mut guard.running;
            let Some(record) = running
                .find_id_by_pid(pid)
                .and_then(|id| running.get_mut(id))
            else {
                warn!(%pid, "attach from unknown process");
                return;
            };
            if record.is_scheduler_bound() {
                debug!(%pid, record_id = %record.record_id(), "process already attached");
                return;
            }
            record.bind_scheduler(scheduler);
            info!(%pid, record_id = %record.record_id(), "process attached");
            record.launch_application(&mut outbox);
        }
        self.flush(outbox);
    }

    /// Launches the application of an attached record still in `Create`
    pub fn launch_application(&self, app_record_id: AppRecordId) {
        self.with_record(app_record_id, |record, outbox| {
            record.launch_application(outbox);
        });
    }

    fn with_record(
        &self,
        id: AppRecordId,
        f: impl FnOnce(&mut AppRunningRecord, &mut Outbox),
    ) -> bool {
        let mut outbox = Outbox::new();
        let found = {
            let mut guard = self.registry.lock();
            match guard.running.get_mut(id) {
                Some(record) => {
                    f(record, &mut outbox);
                    true
                }
                None => {
                    debug!(record_id = %id, "record not found");
                    false
                }
            }
        };
        self.flush(outbox);
        found
    }

    fn with_ability_record(
        &self,
        token: AbilityToken,
        f: impl FnOnce(&mut AppRunningRecord, &mut Outbox) -> bool,
    ) -> bool {
        let mut outbox = Outbox::new();
        let done = {
            let mut guard = self.registry.lock();
            match guard.running.find_by_token_mut(token) {
                Some(record) => f(record, &mut outbox),
                None => {
                    debug!(%token, "no record owns token");
                    false
                }
            }
        };
        self.flush(outbox);
        done
    }

    /// The process reports its application in the foreground
    pub fn application_foregrounded(&self, app_record_id: AppRecordId) {
        let mut outbox = Outbox::new();
        {
            let mut guard = self.registry.lock();
            let Registry { running, recent } = &mut *guard;
            if let Some(record) = running.get_mut(app_record_id) {
                record.application_foregrounded(&mut outbox);
                recent.push_front(app_record_id);
            }
        }
        self.flush(outbox);
    }

    /// The process reports its application in the background
    pub fn application_backgrounded(&self, app_record_id: AppRecordId) {
        self.with_record(app_record_id, |record, outbox| {
            record.application_backgrounded(outbox);
        });
    }

    /// The process exited; removes its record
    pub fn application_terminated(&self, app_record_id: AppRecordId) {
        let mut outbox = Outbox::new();
        {
            let mut guard = self.registry.lock();
            Self::remove_record_locked(&mut guard, app_record_id, &mut outbox);
        }
        self.flush(outbox);
    }

    /// Death notification for a hosted process
    pub fn on_remote_died(&self, pid: ProcessId) {
        let mut outbox = Outbox::new();
        {
            let mut guard = self.registry.lock();
            match guard.running.find_id_by_pid(pid) {
                Some(id) => {
                    warn!(%pid, record_id = %id, "hosted process died");
                    Self::remove_record_locked(&mut guard, id, &mut outbox);
                }
                None => debug!(%pid, "death of untracked process"),
            }
        }
        self.flush(outbox);
    }

    fn remove_record_locked(registry: &mut Registry, id: AppRecordId, outbox: &mut Outbox) -> bool {
        let Some(record) = registry.running.remove(id) else {
            debug!(record_id = %id, "terminate of unknown record");
            return false;
        };
        registry.recent.remove_by_id(id);
        outbox.app_state_changed(record.process_data_with(ApplicationState::Terminated));
        info!(record_id = %id, process_name = record.process_name(), "application record removed");
        true
    }

    /// Requests an ability to move to the foreground or background
    pub fn update_ability_state(&self, token: AbilityToken, state: AbilityState) {
        if AbilityEvent::from_target(state).is_none() {
            debug!(%token, %state, "only foreground and background can be requested");
            return;
        }
        self.with_ability_record(token, |record, outbox| {
            if record.ability(token).map(|a| a.state()) == Some(state) {
                debug!(%token, %state, "ability already in requested state");
                return false;
            }
            record.update_ability_state(token, state, outbox)
        });
    }

    /// Asks the process to clean up a backgrounded ability
    pub fn terminate_ability(&self, token: AbilityToken) {
        self.with_ability_record(token, |record, outbox| record.terminate_ability(token, outbox));
    }

    /// The process finished cleaning an ability
    pub fn ability_terminated(&self, token: AbilityToken) {
        self.with_ability_record(token, |record, outbox| record.ability_terminated(token, outbox));
    }

    /// Removes an ability record without talking to the process
    pub fn clear_ability(&self, token: AbilityToken) -> bool {
        self.with_ability_record(token, |record, _| record.clear_ability(token))
    }

    /// Stores eviction hints for an ability
    pub fn ability_behavior_analysis(
        &self,
        token: AbilityToken,
        pre_token: Option<AbilityToken>,
        visibility: i32,
        perceptibility: i32,
        connection_state: i32,
    ) {
        self.with_ability_record(token, |record, _| {
            if pre_token.is_some() {
                record.set_ability_pre_token(token, pre_token);
            }
            record.set_ability_hints(
                token,
                SchedulingHints {
                    visibility,
                    perceptibility,
                    connection_state,
                },
            )
        });
    }

    /// Forwards a trim level to an attached process
    pub fn schedule_trim_memory(&self, app_record_id: AppRecordId, level: i32) -> Result<(), AppMgrError> {
        self.memory_command(app_record_id, |record, outbox| record.schedule_trim_memory(level, outbox))
    }

    pub fn low_memory_warning(&self, app_record_id: AppRecordId) -> Result<(), AppMgrError> {
        self.memory_command(app_record_id, |record, outbox| record.low_memory_warning(outbox))
    }

    fn memory_command(
        &self,
        id: AppRecordId,
        f: impl FnOnce(&AppRunningRecord, &mut Outbox) -> bool,
    ) -> Result<(), AppMgrError> {
        let mut sent = false;
        let found = self.with_record(id, |record, outbox| sent = f(&*record, outbox));
        match (found, sent) {
            (false, _) => Err(AppMgrError::record_not_found(id)),
            (true, false) => Err(AppMgrError::NotFound(format!("scheduler for {}", id))),
            (true, true) => Ok(()),
        }
    }

    /// Asks the application to exit and forgets it in the recent list
    ///
    /// The record itself goes away once the process reports termination.
    pub fn remove_app_from_recent_list(&self, app_name: &str, process_name: &str) -> Result<(), AppMgrError> {
        if app_name.is_empty() || process_name.is_empty() {
            return Err(AppMgrError::InvalidArgument("application or process name"));
        }
        let mut outbox = Outbox::new();
        let result = {
            let mut guard = self.registry.lock();
            let Registry { running, recent } = &mut *guard;
            match recent.find(app_name, process_name).map(|e| e.record_id) {
                Some(id) => {
                    recent.remove_by_id(id);
                    if let Some(record) = running.get(id) {
                        record.schedule_terminate(&mut outbox);
                    }
                    Ok(())
                }
                None => Err(AppMgrError::NotFound(format!("{}/{}", app_name, process_name))),
            }
        };
        self.flush(outbox);
        result
    }

    pub fn clear_recent_app_list(&self) {
        self.registry.lock().recent.clear();
    }

    /// Recent list, most recent first
    pub fn recent_app_list(&self) -> Vec<AppTaskInfo> {
        self.registry.lock().recent.entries().cloned().collect()
    }

    pub fn get_all_running_processes(&self) -> Vec<RunningProcessInfo> {
        self.registry
            .lock()
            .running
            .records()
            .map(|r| RunningProcessInfo {
                record_id: r.record_id(),
                process_name: r.process_name().to_string(),
                pid: r.pid(),
                uid: r.uid(),
                state: r.state(),
            })
            .collect()
    }

    /// Copy of the record with the given id
    pub fn app_running_record(&self, app_record_id: AppRecordId) -> Option<AppRunningRecord> {
        self.registry.lock().running.get(app_record_id).cloned()
    }

    pub fn app_running_record_by_pid(&self, pid: ProcessId) -> Option<AppRunningRecord> {
        self.registry.lock().running.find_by_pid(pid).cloned()
    }

    pub fn app_running_record_by_token(&self, token: AbilityToken) -> Option<AppRunningRecord> {
        self.registry.lock().running.find_by_token(token).cloned()
    }

    pub fn app_running_record_by_app_name(&self, app_name: &str) -> Option<AppRunningRecord> {
        self.registry.lock().running.find_by_app_name(app_name).cloned()
    }

    pub fn app_running_record_by_process_name(
        &self,
        app_name: &str,
        process_name: &str,
    ) -> Option<AppRunningRecord> {
        self.registry
            .lock()
            .running
            .find_by_name_and_process(app_name, process_name)
            .cloned()
    }

    pub fn record_count(&self) -> usize {
        self.registry.lock().running.len()
    }

    pub fn open_app_spawn_connection(&self) -> Result<(), AppMgrError> {
        let spawner = self
            .spawn_client()
            .ok_or_else(|| AppMgrError::NotFound("spawn client".to_string()))?;
        spawner.open_connection()?;
        Ok(())
    }

    pub fn close_app_spawn_connection(&self) {
        if let Some(spawner) = self.spawn_client() {
            spawner.close_connection();
        }
    }

    pub fn query_app_spawn_connection_state(&self) -> SpawnConnectionState {
        self.spawn_client()
            .map(|s| s.connection_state())
            .unwrap_or_default()
    }

    /// Forgets every process and the recent list
    pub fn stop_all_process(&self) {
        let mut guard = self.registry.lock();
        info!(records = guard.running.len(), "clearing all application records");
        guard.running.clear();
        guard.recent.clear();
    }

    /// Service shutdown
    pub fn on_stop(&self) {
        self.stop_all_process();
        self.close_app_spawn_connection();
    }
}

impl Default for AppMgrService {
    fn default() -> Self {
        Self::new(AppMgrConfig::default())
    }
}

/// Spawner client for the daemon socket named in `config`
#[cfg(unix)]
pub fn socket_spawn_client(config: &AppMgrConfig) -> Arc<dyn AppSpawnClient> {
    use app_spawn::{SocketSpawnClient, UnixSpawnSocket};

    Arc::new(
        SocketSpawnClient::new(UnixSpawnSocket::new(&config.spawn_socket_path))
            .with_retries(config.spawn_connect_retries),
    )
}
