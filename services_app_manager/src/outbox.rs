//! Side effects collected inside the registry critical section
//!
//! Records never call out while the registry lock is held. They push
//! commands and notifications here; the manager delivers them in order
//! once the lock is dropped.

use crate::callback::{AppProcessData, AppStateCallback};
use app_scheduler::{AppScheduler, SchedulerCommand};
use core_types::{AbilityState, AbilityToken};
use std::sync::Arc;

pub(crate) enum Effect {
    Command(Arc<dyn AppScheduler>, SchedulerCommand),
    AppStateChanged(AppProcessData),
    AbilityStateChanged(AbilityToken, AbilityState),
}

#[derive(Default)]
pub(crate) struct Outbox {
    effects: Vec<Effect>,
}

impl Outbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn command(&mut self, scheduler: &Arc<dyn AppScheduler>, command: SchedulerCommand) {
        self.effects
            .push(Effect::Command(Arc::clone(scheduler), command));
    }

    pub(crate) fn app_state_changed(&mut self, data: AppProcessData) {
        self.effects.push(Effect::AppStateChanged(data));
    }

    pub(crate) fn ability_state_changed(&mut self, token: AbilityToken, state: AbilityState) {
        self.effects.push(Effect::AbilityStateChanged(token, state));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn commands(&self) -> Vec<SchedulerCommand> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Command(_, command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn ability_notifications(&self) -> Vec<(AbilityToken, AbilityState)> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::AbilityStateChanged(token, state) => Some((*token, *state)),
                _ => None,
            })
            .collect()
    }

    /// Sends every command and notification, oldest first
    pub(crate) fn deliver(self, observers: &[Arc<dyn AppStateCallback>]) {
        for effect in self.effects {
            match effect {
                Effect::Command(scheduler, command) => command.deliver(scheduler.as_ref()),
                Effect::AppStateChanged(data) => {
                    for observer in observers {
                        observer.on_app_state_changed(&data);
                    }
                }
                Effect::AbilityStateChanged(token, state) => {
                    for observer in observers {
                        observer.on_ability_request_done(token, state);
                    }
                }
            }
        }
    }
}
