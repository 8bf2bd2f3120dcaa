//! Entities for Trove.
//!
//! An entity is a struct stored as a top-level [`Record`](trove_types::Record).
//! Its [`EntitySchema`] names the record kind, binds the key's id (and
//! optionally its parent) to struct fields, and lists the stored fields.
//! [`EntityMapper`] drives a save or load of one entity through the
//! translators of its schema.

pub mod id;
pub mod mapper;
pub mod schema;

pub use id::IdValue;
pub use mapper::{EntityMapper, LoadReport, TranslatedEntity};
pub use schema::{EntitySchema, EntitySchemaBuilder};
