//! Bundle, application and ability descriptors
//!
//! Descriptors are supplied by callers at load time and treated as
//! read-only configuration once attached to a record.

use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) for a valid uid
pub const MAX_UID: i32 = i32::MAX;

/// Returns true when `uid` lies in `[0, MAX_UID)`
pub fn is_valid_uid(uid: i32) -> bool {
    (0..MAX_UID).contains(&uid)
}

/// Identity of the installable unit an ability belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleIdentity {
    /// Bundle (package) name
    pub bundle_name: String,
    /// Module name inside the bundle
    pub module_name: String,
    /// Device the bundle is installed on
    pub device_id: String,
}

impl BundleIdentity {
    /// Creates an identity for a bundle on the local device
    pub fn new(bundle_name: impl Into<String>) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            module_name: String::new(),
            device_id: String::new(),
        }
    }

    /// Sets the module name
    pub fn with_module(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    /// Sets the device id
    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }
}

/// Kind of ability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityType {
    #[default]
    Page,
    Service,
    Data,
}

impl AbilityType {
    /// Wire value
    pub fn as_i32(self) -> i32 {
        match self {
            AbilityType::Page => 1,
            AbilityType::Service => 2,
            AbilityType::Data => 3,
        }
    }

    /// Parses a wire value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(AbilityType::Page),
            2 => Some(AbilityType::Service),
            3 => Some(AbilityType::Data),
            _ => None,
        }
    }
}

/// How many instances of an ability may exist in one process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaunchMode {
    /// A new instance per start request
    #[default]
    Standard,
    /// Reuse the instance on top of the mission stack
    SingleTop,
    /// At most one instance per process
    Singleton,
}

impl LaunchMode {
    /// Wire value
    pub fn as_i32(self) -> i32 {
        match self {
            LaunchMode::Singleton => 0,
            LaunchMode::SingleTop => 1,
            LaunchMode::Standard => 2,
        }
    }

    /// Parses a wire value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(LaunchMode::Singleton),
            1 => Some(LaunchMode::SingleTop),
            2 => Some(LaunchMode::Standard),
            _ => None,
        }
    }
}

/// Static description of one ability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityInfo {
    /// Ability name, unique inside its bundle
    pub name: String,
    /// Name of the application that owns the ability
    pub application_name: String,
    /// Owning bundle
    pub bundle: BundleIdentity,
    /// Kind of ability
    pub kind: AbilityType,
    /// Instance policy
    pub launch_mode: LaunchMode,
    /// Process affinity; empty means the bundle's default process
    pub process: String,
}

impl AbilityInfo {
    /// Creates a page ability with standard launch mode
    pub fn new(
        name: impl Into<String>,
        application_name: impl Into<String>,
        bundle: BundleIdentity,
    ) -> Self {
        Self {
            name: name.into(),
            application_name: application_name.into(),
            bundle,
            kind: AbilityType::Page,
            launch_mode: LaunchMode::Standard,
            process: String::new(),
        }
    }

    /// Sets the ability kind
    pub fn with_kind(mut self, kind: AbilityType) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the launch mode
    pub fn with_launch_mode(mut self, launch_mode: LaunchMode) -> Self {
        self.launch_mode = launch_mode;
        self
    }

    /// Sets the process affinity name
    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.process = process.into();
        self
    }

    /// Returns true for singleton abilities
    pub fn is_singleton(&self) -> bool {
        self.launch_mode == LaunchMode::Singleton
    }
}

/// Static description of an application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    /// Application name
    pub name: String,
    /// Bundle the application is installed from
    pub bundle_name: String,
    /// User id assigned at install time, if known
    pub uid: Option<i32>,
}

impl ApplicationInfo {
    /// Creates application info without an assigned uid
    pub fn new(name: impl Into<String>, bundle_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundle_name: bundle_name.into(),
            uid: None,
        }
    }

    /// Sets the install-time uid
    pub fn with_uid(mut self, uid: i32) -> Self {
        self.uid = Some(uid);
        self
    }
}
