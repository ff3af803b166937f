//! # Inter-Process Communication (IPC)
//!
//! Binary marshalling shared by the application manager and the processes
//! it hosts.
//!
//! ## Philosophy
//!
//! - **Bit-exact**: The layout is fixed and documented per type; both sides
//!   of a connection read exactly what the other wrote.
//! - **Explicit absence**: Optional nested values carry a null/object
//!   discriminator instead of sentinel values.
//! - **Fail closed**: Truncated or malformed input yields a [`ParcelError`],
//!   never a partially filled value.
//!
//! ## Key Types
//!
//! - [`Parcel`]: Little-endian byte buffer with a read cursor
//! - [`Parcelable`]: Values that know their own wire layout
//! - [`Operation`] / [`OperationBuilder`]: Inter-component request
//! - [`Uri`]: Resource identifier carried by an operation

pub mod operation;
pub mod parcel;
pub mod uri;

pub use operation::{Operation, OperationBuilder};
pub use parcel::{Parcel, ParcelError, Parcelable, VALUE_NULL, VALUE_OBJECT};
pub use uri::Uri;
