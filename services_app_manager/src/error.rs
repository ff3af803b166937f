//! Application manager errors

use app_spawn::SpawnError;
use core_types::{AbilityToken, AppRecordId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppMgrError {
    /// A required field was absent or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Invalid uid: {0}")]
    InvalidUid(i32),

    /// The token already has an ability record
    #[error("Ability already exists: {0}")]
    AlreadyExists(AbilityToken),

    /// Every record id has been handed out
    #[error("Record ids exhausted")]
    IdsExhausted,

    #[error("Spawn failed: {0}")]
    SpawnFailed(#[from] SpawnError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppMgrError {
    pub(crate) fn record_not_found(id: AppRecordId) -> Self {
        AppMgrError::NotFound(id.to_string())
    }
}

/// Outcome of a find-or-create request on the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordQueryResult {
    pub app_record_id: AppRecordId,
    /// The application record existed before the call
    pub app_exists: bool,
    /// The ability (by token, or by name for singletons) existed before the call
    pub ability_exists: bool,
}
