//! High-level SDK for Trove.
//!
//! Register an [`EntitySchema`] per entity type, then save and load entities
//! against any [`RecordStore`]. This is the main entry point for
//! applications embedding Trove.

pub mod config;
pub mod error;
pub mod trove;

pub use config::SdkConfig;
pub use error::{SdkError, SdkResult};
pub use trove::Trove;

// Re-export key types
pub use trove_entity::{EntityMapper, EntitySchema, IdValue, LoadReport};
pub use trove_store::{InMemoryRecordStore, RecordStore};
pub use trove_translate::{ClassSchema, NullPolicy, TranslateConfig, Translators};
pub use trove_types::{Key, KeyId, Record, Value};
