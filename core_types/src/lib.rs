//! # Core Types
//!
//! This crate defines the fundamental types shared by the application
//! manager, the spawner client and the scheduler connection.
//!
//! ## Philosophy
//!
//! - **Opaque handles**: tokens and pids are copyable newtypes compared by
//!   identity, never raw references.
//! - **Validated at the edge**: uid ranges and descriptor fields are checked
//!   before a record is created.
//!
//! ## Key Types
//!
//! - [`AbilityToken`]: Cross-process handle for one ability instance
//! - [`AppRecordId`]: Identifier of an application record
//! - [`ProcessId`]: Spawned process handle
//! - [`AbilityInfo`] / [`ApplicationInfo`]: Caller supplied descriptors
//! - [`ApplicationState`] / [`AbilityState`]: Lifecycle states

pub mod bundle;
pub mod ids;
pub mod state;

pub use bundle::{
    is_valid_uid, AbilityInfo, AbilityType, ApplicationInfo, BundleIdentity, LaunchMode, MAX_UID,
};
pub use ids::{AbilityToken, AppRecordId, ProcessId};
pub use state::{AbilityState, ApplicationState};
