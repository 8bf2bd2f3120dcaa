//! Foundation types for Trove.
//!
//! This crate provides the value model exchanged between the translation
//! engine and the storage boundary. Every other Trove crate depends on
//! `trove-types`.
//!
//! # Key Types
//!
//! - [`Value`] -- Generic typed-value tree as stored by the backing datastore
//! - [`ValueType`] -- Discriminator for [`Value`] variants
//! - [`Key`] -- Entity key: kind, optional id, optional parent
//! - [`Record`] -- A key plus its map of named properties
//! - [`Path`] -- Immutable cursor into a nested object graph, for diagnostics

pub mod error;
pub mod key;
pub mod path;
pub mod record;
pub mod value;

pub use error::TypeError;
pub use key::{validate_kind, Key, KeyId};
pub use path::{Path, Segment};
pub use record::Record;
pub use value::{Value, ValueType};
