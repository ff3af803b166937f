//! Operation: the structured request exchanged between components
//!
//! An operation names a target (bundle, ability, device), an action, a set
//! of entity tags, a flag mask and an optional URI. Values are immutable
//! once built; use [`OperationBuilder`] to assemble one.
//!
//! ## Wire layout
//!
//! 1. ability name (string)
//! 2. action (string)
//! 3. bundle name (string)
//! 4. device id (string)
//! 5. entities (string list)
//! 6. flags (`u32`)
//! 7. URI discriminator (`-1` absent, `1` present), then the URI when present

use crate::parcel::{Parcel, ParcelError, Parcelable};
use crate::uri::Uri;
use serde::{Deserialize, Serialize};

/// Immutable inter-component request
///
/// Equality ignores the device id: it is carried on the wire but two
/// operations targeting the same component on different devices compare
/// equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    ability_name: String,
    action: String,
    bundle_name: String,
    device_id: String,
    entities: Vec<String>,
    flags: u32,
    uri: Option<Uri>,
}

impl Operation {
    /// Starts building an operation
    pub fn builder() -> OperationBuilder {
        OperationBuilder::new()
    }

    pub fn ability_name(&self) -> &str {
        &self.ability_name
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Entity tags in insertion order
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn has_entity(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    /// Serializes into a fresh parcel
    pub fn to_parcel(&self) -> Result<Parcel, ParcelError> {
        let mut parcel = Parcel::new();
        self.marshal(&mut parcel)?;
        Ok(parcel)
    }

    /// Deserializes from raw bytes, rejecting trailing data
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ParcelError> {
        let mut parcel = Parcel::from_bytes(bytes);
        let op = Self::unmarshal(&mut parcel)?;
        if parcel.remaining() != 0 {
            return Err(ParcelError::TrailingBytes(parcel.remaining()));
        }
        Ok(op)
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.ability_name == other.ability_name
            && self.action == other.action
            && self.bundle_name == other.bundle_name
            && self.entities == other.entities
            && self.flags == other.flags
            && self.uri.as_ref().map(Uri::as_str) == other.uri.as_ref().map(Uri::as_str)
    }
}

impl Eq for Operation {}

impl Parcelable for Operation {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_string(&self.ability_name)?;
        parcel.write_string(&self.action)?;
        parcel.write_string(&self.bundle_name)?;
        parcel.write_string(&self.device_id)?;
        parcel.write_string_vec(&self.entities)?;
        parcel.write_u32(self.flags);
        parcel.write_optional(self.uri.as_ref())
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let ability_name = parcel.read_string()?;
        let action = parcel.read_string()?;
        let bundle_name = parcel.read_string()?;
        let device_id = parcel.read_string()?;

        let raw_entities = parcel.read_string_vec()?;
        let mut entities: Vec<String> = Vec::with_capacity(raw_entities.len());
        for entity in raw_entities {
            if entities.contains(&entity) {
                return Err(ParcelError::DuplicateEntity(entity));
            }
            entities.push(entity);
        }

        let flags = parcel.read_u32()?;
        let uri = parcel.read_optional::<Uri>()?;

        Ok(Self {
            ability_name,
            action,
            bundle_name,
            device_id,
            entities,
            flags,
            uri,
        })
    }
}

/// Accumulates fields for an [`Operation`]
///
/// `build` hands out a copy, so one builder can stamp out several
/// operations.
#[derive(Debug, Clone, Default)]
pub struct OperationBuilder {
    op: Operation,
}

impl OperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ability_name(mut self, name: impl Into<String>) -> Self {
        self.op.ability_name = name.into();
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.op.action = action.into();
        self
    }

    pub fn bundle_name(mut self, name: impl Into<String>) -> Self {
        self.op.bundle_name = name.into();
        self
    }

    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.op.device_id = device_id.into();
        self
    }

    /// Appends an entity tag; a tag already present is ignored
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        let entity = entity.into();
        if !self.op.entities.contains(&entity) {
            self.op.entities.push(entity);
        }
        self
    }

    /// Appends several entity tags, skipping duplicates
    pub fn entities<I, S>(self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        entities.into_iter().fold(self, |builder, e| builder.entity(e))
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.op.flags = flags;
        self
    }

    pub fn uri(mut self, uri: impl Into<Uri>) -> Self {
        self.op.uri = Some(uri.into());
        self
    }

    pub fn build(&self) -> Operation {
        self.op.clone()
    }
}
