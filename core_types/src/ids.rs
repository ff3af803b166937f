//! Identifiers for abilities, application records and processes

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque handle identifying one ability instance
///
/// Tokens carry no data of their own. They cross process boundaries
/// and are compared by identity only. A caller's token passed along with
/// a start request is called the pre-token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityToken(Uuid);

impl AbilityToken {
    /// Creates a new random token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a token from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the raw bytes used on the wire
    pub fn to_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    /// Rebuilds a token from its wire bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for AbilityToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AbilityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

/// Identifier of an application record
///
/// Record ids are handed out by the registry, start at 1 and grow
/// monotonically for the lifetime of the hosting process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppRecordId(i32);

impl AppRecordId {
    /// Wraps a raw record id
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw record id
    pub const fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AppRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppRecord({})", self.0)
    }
}

/// Operating system process handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(i32);

impl ProcessId {
    /// Wraps a raw pid
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw pid
    pub const fn as_raw(&self) -> i32 {
        self.0
    }

    /// Only strictly positive pids refer to a spawned process
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let t1 = AbilityToken::new();
        let t2 = AbilityToken::new();
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_token_from_uuid() {
        let uuid = Uuid::new_v4();
        let token = AbilityToken::from_uuid(uuid);
        assert_eq!(token.as_uuid(), uuid);
    }

    #[test]
    fn test_token_bytes() {
        let token = AbilityToken::new();
        assert_eq!(AbilityToken::from_bytes(token.to_bytes()), token);
    }

    #[test]
    fn test_token_display() {
        let token = AbilityToken::new();
        assert!(format!("{}", token).starts_with("Token("));
    }

    #[test]
    fn test_record_id_display() {
        let id = AppRecordId::from_raw(7);
        assert_eq!(id.as_raw(), 7);
        assert_eq!(format!("{}", id), "AppRecord(7)");
    }

    #[test]
    fn test_process_id_validity() {
        assert!(ProcessId::new(1).is_valid());
        assert!(!ProcessId::new(0).is_valid());
        assert!(!ProcessId::new(-3).is_valid());
    }

    #[test]
    fn test_ids_serialization() {
        let token = AbilityToken::new();
        let json = serde_json::to_string(&token).unwrap();
        let back: AbilityToken = serde_json::from_str(&json).unwrap();
        assert_eq!(token, back);

        let pid = ProcessId::new(42);
        let json = serde_json::to_string(&pid).unwrap();
        assert_eq!(json, "42");
    }
}
