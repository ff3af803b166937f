//! Lifecycle states shared by records, observers and the wire

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an application process
///
/// Termination removes the record, so there is no terminated variant
/// on the record itself. [`ApplicationState::Terminated`] only appears
/// in observer notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationState {
    Create,
    Ready,
    Foreground,
    Background,
    Terminated,
    End,
}

impl ApplicationState {
    /// Wire value
    pub fn as_i32(self) -> i32 {
        match self {
            ApplicationState::Create => 0,
            ApplicationState::Ready => 1,
            ApplicationState::Foreground => 2,
            ApplicationState::Background => 4,
            ApplicationState::Terminated => 5,
            ApplicationState::End => 6,
        }
    }

    /// Parses a wire value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ApplicationState::Create),
            1 => Some(ApplicationState::Ready),
            2 => Some(ApplicationState::Foreground),
            4 => Some(ApplicationState::Background),
            5 => Some(ApplicationState::Terminated),
            6 => Some(ApplicationState::End),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplicationState::Create => "CREATE",
            ApplicationState::Ready => "READY",
            ApplicationState::Foreground => "FOREGROUND",
            ApplicationState::Background => "BACKGROUND",
            ApplicationState::Terminated => "TERMINATED",
            ApplicationState::End => "END",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of a single ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityState {
    Begin,
    Create,
    Ready,
    Foreground,
    Background,
    End,
}

impl AbilityState {
    /// Wire value
    pub fn as_i32(self) -> i32 {
        match self {
            AbilityState::Begin => 0,
            AbilityState::Ready => 1,
            AbilityState::Foreground => 2,
            AbilityState::Background => 4,
            AbilityState::End => 5,
            AbilityState::Create => 6,
        }
    }

    /// Parses a wire value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(AbilityState::Begin),
            1 => Some(AbilityState::Ready),
            2 => Some(AbilityState::Foreground),
            4 => Some(AbilityState::Background),
            5 => Some(AbilityState::End),
            6 => Some(AbilityState::Create),
            _ => None,
        }
    }
}

impl fmt::Display for AbilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AbilityState::Begin => "BEGIN",
            AbilityState::Create => "CREATE",
            AbilityState::Ready => "READY",
            AbilityState::Foreground => "FOREGROUND",
            AbilityState::Background => "BACKGROUND",
            AbilityState::End => "END",
        };
        f.write_str(name)
    }
}
