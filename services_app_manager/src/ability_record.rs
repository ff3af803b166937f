//! Runtime state of one ability instance

use core_types::{AbilityInfo, AbilityState, AbilityToken};

/// Hints consumed by the process eviction policy
///
/// The manager only stores them; interpretation happens elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulingHints {
    pub visibility: i32,
    pub perceptibility: i32,
    pub connection_state: i32,
}

/// An ability hosted in an application process
#[derive(Debug, Clone)]
pub struct AbilityRunningRecord {
    info: AbilityInfo,
    token: AbilityToken,
    pre_token: Option<AbilityToken>,
    state: AbilityState,
    hints: SchedulingHints,
}

impl AbilityRunningRecord {
    /// Creates a record in [`AbilityState::Begin`]
    pub fn new(info: AbilityInfo, token: AbilityToken) -> Self {
        Self {
            info,
            token,
            pre_token: None,
            state: AbilityState::Begin,
            hints: SchedulingHints::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &AbilityInfo {
        &self.info
    }

    pub fn token(&self) -> AbilityToken {
        self.token
    }

    /// Token of the ability that started this one
    pub fn pre_token(&self) -> Option<AbilityToken> {
        self.pre_token
    }

    pub fn state(&self) -> AbilityState {
        self.state
    }

    pub fn hints(&self) -> SchedulingHints {
        self.hints
    }

    pub(crate) fn set_pre_token(&mut self, pre_token: Option<AbilityToken>) {
        self.pre_token = pre_token;
    }

    /// Removal is the only way out, so `End` is never stored
    pub(crate) fn set_state(&mut self, state: AbilityState) {
        if state == AbilityState::End {
            return;
        }
        self.state = state;
    }

    pub(crate) fn set_hints(&mut self, hints: SchedulingHints) {
        self.hints = hints;
    }
}
