//! Translator composition framework for Trove.
//!
//! Converts strongly typed Rust values to the generic [`Value`] tree on save
//! and back on load. Each field type is handled by a [`Translator`]; container
//! translators recurse into their elements, so a schema is a tree of
//! translators resolved once at registration time and shared afterwards.
//!
//! # Load semantics
//!
//! - A property missing from its parent yields [`Outcome::Skip`]: the target
//!   keeps whatever it already held.
//! - An explicit [`Value::Null`] yields the null value of the field type.
//! - Containers and embedded structs *recycle*: when the target already holds
//!   a value at that position it is populated in place, and if nothing
//!   changed the load reports `Skip` so the parent leaves the field alone.
//!
//! # Save semantics
//!
//! Empty containers are omitted from their parent rather than stored empty;
//! loading the omitted property into a fresh object leaves its (empty)
//! default in place.
//!
//! [`Value`]: trove_types::Value
//! [`Value::Null`]: trove_types::Value::Null

pub mod class;
pub mod collection;
pub mod config;
pub mod context;
pub mod error;
pub mod map;
pub mod nullable;
pub mod outcome;
pub mod polymorphic;
pub mod registry;
pub mod scalar;
pub mod translator;

pub use class::{ClassSchema, ClassSchemaBuilder, ClassTranslator, Field, FieldOptions, Property};
pub use collection::{ListTranslator, SetTranslator};
pub use config::{NullPolicy, TranslateConfig};
pub use context::{KeyListeners, LoadContext, RecycleStats, SaveContext};
pub use error::{SchemaError, SchemaResult, TranslateError, TranslateResult};
pub use map::MapTranslator;
pub use nullable::Nullable;
pub use outcome::{Outcome, Recycle};
pub use polymorphic::{Polymorphic, PolymorphicBuilder, DISCRIMINATOR};
pub use registry::Translators;
pub use scalar::{EnumTranslator, Scalar, ScalarCodec};
pub use translator::{Recycles, Recycling, Translator};
