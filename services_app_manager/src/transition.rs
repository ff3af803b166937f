//! Guarded lifecycle transition tables
//!
//! Every legal transition is one row in a `match`. A combination without a
//! row is rejected: the caller leaves the record untouched and sends no
//! command.

use core_types::{AbilityState, ApplicationState};

/// Inputs that move an application record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The process attached and the application was launched
    Launch,
    /// The process reported its application in the foreground
    Foregrounded,
    /// The process reported its application in the background
    Backgrounded,
}

/// Next application state, or `None` when the event is not legal now
pub fn app_transition(current: ApplicationState, event: AppEvent) -> Option<ApplicationState> {
    use ApplicationState as A;

    match (current, event) {
        (A::Create, AppEvent::Launch) => Some(A::Ready),
        (A::Ready | A::Background, AppEvent::Foregrounded) => Some(A::Foreground),
        (A::Foreground, AppEvent::Backgrounded) => Some(A::Background),
        _ => None,
    }
}

/// Inputs that move an ability record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityEvent {
    Launch,
    MoveToForeground,
    MoveToBackground,
}

impl AbilityEvent {
    /// Maps a requested target state to its event
    ///
    /// Only foreground and background can be requested from outside.
    pub fn from_target(target: AbilityState) -> Option<Self> {
        match target {
            AbilityState::Foreground => Some(AbilityEvent::MoveToForeground),
            AbilityState::Background => Some(AbilityEvent::MoveToBackground),
            _ => None,
        }
    }
}

/// Result of an accepted ability event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityTransition {
    /// Move to the state right away
    Apply(AbilityState),
    /// Bring the application to the foreground first; the ability follows
    /// once the process confirms
    AwaitAppForeground,
}

/// Looks up `(ability state, event, application state)`
pub fn ability_transition(
    current: AbilityState,
    event: AbilityEvent,
    app: ApplicationState,
) -> Option<AbilityTransition> {
    use AbilityState as S;
    use AbilityTransition::{Apply, AwaitAppForeground};
    use ApplicationState as A;

    match (current, event, app) {
        (S::Create, AbilityEvent::Launch, A::Ready | A::Foreground | A::Background) => {
            Some(Apply(S::Ready))
        }
        (S::Ready | S::Background, AbilityEvent::MoveToForeground, A::Foreground) => {
            Some(Apply(S::Foreground))
        }
        (S::Ready | S::Background, AbilityEvent::MoveToForeground, A::Ready | A::Background) => {
            Some(AwaitAppForeground)
        }
        (S::Foreground, AbilityEvent::MoveToBackground, A::Ready | A::Foreground | A::Background) => {
            Some(Apply(S::Background))
        }
        _ => None,
    }
}
