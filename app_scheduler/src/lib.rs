//! # App Scheduler
//!
//! The remote command surface the manager uses to drive a hosted process.
//!
//! ## Philosophy
//!
//! - **One-way**: Commands never return values and the manager never waits.
//! - **Interface first**: The manager holds an `Arc<dyn AppScheduler>`; it
//!   cannot tell an IPC proxy from an in-memory double.
//! - **Explicit wire codes**: Each [`SchedulerCommand`] has a stable code and
//!   a parcel layout, decoded on the process side by [`SchedulerStub`].
//!
//! ## Key Types
//!
//! - [`AppScheduler`]: Trait implemented by every connection flavor
//! - [`AppSchedulerProxy`]: Encodes commands onto a [`SchedulerTransport`]
//! - [`SchedulerStub`] / [`LoopbackTransport`]: Process-side decoding
//! - [`RecordingScheduler`]: Test double with an ordered command log

pub mod command;
pub mod error;
pub mod proxy;
pub mod recording;
pub mod scheduler;
pub mod stub;

pub use command::{AppLaunchData, SchedulerCommand};
pub use error::SchedulerError;
pub use proxy::{AppSchedulerProxy, SchedulerTransport};
pub use recording::RecordingScheduler;
pub use scheduler::AppScheduler;
pub use stub::{LoopbackTransport, SchedulerStub};
