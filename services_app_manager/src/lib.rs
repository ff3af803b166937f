//! # Application Manager Service
//!
//! Tracks running application processes and the abilities hosted in them,
//! spawns processes on demand, and drives both through their lifecycles.
//!
//! ## Philosophy
//!
//! - One record per process name; a record owns its abilities
//! - Lifecycle changes follow explicit transition tables, never ad-hoc flags
//! - Processes are created by asking a spawner, never by forking
//! - Scheduler commands and observer notifications leave the manager only
//!   after the registry lock is released
//!
//! ## Lifecycle
//!
//! ```text
//! load_ability ──► record (Create) ──► spawn ──► attach_application
//!                                                  │
//!                                                  ▼
//!                      Ready ◄──► Foreground ◄──► Background
//!                                                  │
//!                                    application_terminated ──► removed
//! ```

pub mod ability_record;
pub mod app_record;
pub mod callback;
pub mod config;
pub mod error;
pub(crate) mod outbox;
pub mod recent_list;
pub mod running_manager;
pub mod service;
pub mod transition;

pub use ability_record::{AbilityRunningRecord, SchedulingHints};
pub use app_record::{AddAbilityOutcome, AppRunningRecord};
pub use callback::{AppProcessData, AppStateCallback};
pub use config::{AppMgrConfig, ConfigError};
pub use error::{AppMgrError, RecordQueryResult};
pub use recent_list::{AppTaskInfo, RecentAppList};
pub use running_manager::AppRunningManager;
pub use service::{AppMgrService, RunningProcessInfo};
pub use transition::{ability_transition, app_transition, AbilityEvent, AbilityTransition, AppEvent};

#[cfg(unix)]
pub use service::socket_spawn_client;
