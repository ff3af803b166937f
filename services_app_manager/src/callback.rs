//! Observers of application and ability state changes

use core_types::{AbilityState, AbilityToken, AppRecordId, ApplicationState, ProcessId};
use serde::{Deserialize, Serialize};

/// Snapshot of a process pushed to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProcessData {
    pub record_id: AppRecordId,
    pub app_name: String,
    pub process_name: String,
    pub pid: Option<ProcessId>,
    pub state: ApplicationState,
}

/// Receives push notifications from the manager
///
/// Delivery happens after the registry lock is released, so an observer
/// may call back into the manager.
pub trait AppStateCallback: Send + Sync {
    fn on_app_state_changed(&self, data: &AppProcessData);

    fn on_ability_request_done(&self, token: AbilityToken, state: AbilityState);
}
