//! Record storage boundary for Trove.
//!
//! The translation engine never talks to a datastore directly. It produces
//! and consumes [`Record`](trove_types::Record)s; this crate defines the
//! key-value contract a persistence layer must satisfy to carry them.
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. `put` with an incomplete key allocates an id and returns the completed key.
//! 2. `put` with a complete key overwrites any existing record under that key.
//! 3. `get` never allocates; an incomplete key is an error.
//! 4. The store never interprets property values.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use traits::RecordStore;
