//! Lifecycle Test Utilities
//!
//! Shared fixtures for the application manager integration tests.
//!
//! ## Test Philosophy
//!
//! - **No real processes**: Spawning goes through `SimulatedSpawner`
//! - **Observable side effects**: Every scheduler command lands in a `RecordingScheduler`
//! - **Observable notifications**: Every observer callback lands in a `CollectingCallback`
//! - **Deterministic**: Pids start at `FIRST_SIMULATED_PID` and increase by one

use app_scheduler::RecordingScheduler;
use app_spawn::SimulatedSpawner;
use core_types::{
    AbilityInfo, AbilityState, AbilityToken, AppRecordId, ApplicationInfo, ApplicationState,
    BundleIdentity, ProcessId,
};
use parking_lot::Mutex;
use services_app_manager::{AppMgrConfig, AppMgrService, AppProcessData, AppStateCallback};
use std::sync::Arc;

/// Observer that stores every notification it receives
#[derive(Default)]
pub struct CollectingCallback {
    app_events: Mutex<Vec<AppProcessData>>,
    ability_events: Mutex<Vec<(AbilityToken, AbilityState)>>,
}

impl CollectingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_events(&self) -> Vec<AppProcessData> {
        self.app_events.lock().clone()
    }

    /// Application states reported for one record, in order
    pub fn app_states(&self, record_id: AppRecordId) -> Vec<ApplicationState> {
        self.app_events
            .lock()
            .iter()
            .filter(|e| e.record_id == record_id)
            .map(|e| e.state)
            .collect()
    }

    /// Ability states reported for one token, in order
    pub fn ability_states(&self, token: AbilityToken) -> Vec<AbilityState> {
        self.ability_events
            .lock()
            .iter()
            .filter(|(t, _)| *t == token)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn clear(&self) {
        self.app_events.lock().clear();
        self.ability_events.lock().clear();
    }
}

impl AppStateCallback for CollectingCallback {
    fn on_app_state_changed(&self, data: &AppProcessData) {
        self.app_events.lock().push(data.clone());
    }

    fn on_ability_request_done(&self, token: AbilityToken, state: AbilityState) {
        self.ability_events.lock().push((token, state));
    }
}

/// A manager wired to a simulated spawner and a collecting observer
pub struct Harness {
    pub service: Arc<AppMgrService>,
    pub spawner: Arc<SimulatedSpawner>,
    pub observer: Arc<CollectingCallback>,
}

impl Harness {
    /// Loads `ability` as a fresh token and returns the token with the
    /// id of the record hosting it
    pub fn load(&self, app: &ApplicationInfo, ability: &AbilityInfo) -> (AbilityToken, Option<AppRecordId>) {
        let token = AbilityToken::new();
        self.service.load_ability(Some(token), None, Some(ability), Some(app));
        let id = self
            .service
            .app_running_record_by_token(token)
            .map(|r| r.record_id());
        (token, id)
    }

    /// Attaches the process behind `record_id` with a recording scheduler
    pub fn attach(&self, record_id: AppRecordId) -> RecordingScheduler {
        let scheduler = RecordingScheduler::new();
        let pid = self.pid_of(record_id);
        self.service
            .attach_application(pid, Some(Arc::new(scheduler.clone())));
        scheduler
    }

    pub fn pid_of(&self, record_id: AppRecordId) -> ProcessId {
        self.service
            .app_running_record(record_id)
            .and_then(|r| r.pid())
            .unwrap_or(ProcessId::new(0))
    }

    pub fn app_state(&self, record_id: AppRecordId) -> Option<ApplicationState> {
        self.service.app_running_record(record_id).map(|r| r.state())
    }

    pub fn ability_state(&self, token: AbilityToken) -> Option<AbilityState> {
        self.service
            .app_running_record_by_token(token)
            .and_then(|r| r.ability(token).map(|a| a.state()))
    }
}

/// Bootstrap helper for tests
///
/// Creates a manager with the default configuration, a simulated spawner,
/// and a registered collecting observer.
pub fn test_bootstrap() -> Harness {
    test_bootstrap_with(AppMgrConfig::default())
}

pub fn test_bootstrap_with(config: AppMgrConfig) -> Harness {
    init_tracing();
    let spawner = Arc::new(SimulatedSpawner::new());
    let observer = Arc::new(CollectingCallback::new());
    let service = AppMgrService::new(config).with_spawn_client(spawner.clone());
    service.register_app_state_callback(observer.clone());
    Harness {
        service: Arc::new(service),
        spawner,
        observer,
    }
}

pub fn demo_app() -> ApplicationInfo {
    ApplicationInfo::new("demo", "com.example.demo")
}

pub fn demo_ability(name: &str) -> AbilityInfo {
    AbilityInfo::new(name, "demo", BundleIdentity::new("com.example.demo"))
}

/// Routes manager logs to the test output; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}
