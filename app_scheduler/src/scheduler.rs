//! The one-way command surface of a hosted process

use crate::AppLaunchData;
use core_types::{AbilityInfo, AbilityToken};

/// Lifecycle commands pushed into a hosted application process
///
/// Every method is one-way: the manager never waits for an answer.
/// The process reports progress through separate inbound calls on the
/// manager (attach, foregrounded, ability terminated, ...).
pub trait AppScheduler: Send + Sync {
    /// Initialize the application inside the freshly attached process
    fn schedule_launch_application(&self, data: &AppLaunchData);

    /// Create an ability instance
    fn schedule_launch_ability(&self, info: &AbilityInfo, token: AbilityToken);

    fn schedule_foreground_application(&self);

    fn schedule_background_application(&self);

    fn schedule_terminate_application(&self);

    /// Tear down an ability that has reached the background
    fn schedule_clean_ability(&self, token: AbilityToken);

    /// Ask the process to release memory at the given trim level
    fn schedule_shrink_memory(&self, level: i32);

    fn schedule_low_memory(&self);
}
