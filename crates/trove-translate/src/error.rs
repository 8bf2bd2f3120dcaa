//! Error types for the translation pipeline.

use trove_types::{Path, ValueType};

/// Errors raised while translating a value in either direction.
///
/// Every variant that arises inside the recursive descent carries the
/// [`Path`] of the value being translated.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TranslateError {
    /// The stored value has the wrong shape for the field type.
    #[error("{path}: expected {expected}, found {found}")]
    Mismatch {
        path: Path,
        expected: ValueType,
        found: ValueType,
    },

    /// A stored integer does not fit the narrower field type.
    #[error("{path}: value {value} out of range for {target}")]
    OutOfRange {
        path: Path,
        value: i64,
        target: &'static str,
    },

    /// A stored name matches no variant of the field type.
    #[error("{path}: unknown variant {name:?}")]
    UnknownVariant { path: Path, name: String },

    /// A polymorphic value was stored without its discriminator and the
    /// type has no default variant.
    #[error("{path}: missing discriminator")]
    MissingDiscriminator { path: Path },

    /// A polymorphic value matches none of its registered variants.
    #[error("{path}: value matches no registered variant")]
    UnmatchedVariant { path: Path },

    /// Nesting went deeper than `TranslateConfig::max_depth`.
    #[error("{path}: nesting exceeds limit of {limit}")]
    DepthExceeded { path: Path, limit: usize },

    /// The record handed to a mapper belongs to another kind.
    #[error("expected record of kind {expected}, found {found}")]
    KindMismatch { expected: String, found: String },

    /// The entity has no id and its id type cannot be allocated by the store.
    #[error("{kind}: id is required")]
    MissingId { kind: String },

    /// The key's id cannot be stored in the entity's id field.
    #[error("key {key}: id does not fit the id field ({expected})")]
    IdMismatch { key: String, expected: &'static str },

    /// Raised by user translators.
    #[error("{path}: {message}")]
    Custom { path: Path, message: String },
}

impl TranslateError {
    /// Shorthand for a [`TranslateError::Mismatch`].
    pub fn mismatch(path: &Path, expected: ValueType, found: ValueType) -> Self {
        Self::Mismatch {
            path: path.clone(),
            expected,
            found,
        }
    }

    pub fn custom(path: &Path, message: impl Into<String>) -> Self {
        Self::Custom {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// The location of the failure, when it happened inside a value.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Mismatch { path, .. }
            | Self::OutOfRange { path, .. }
            | Self::UnknownVariant { path, .. }
            | Self::MissingDiscriminator { path }
            | Self::UnmatchedVariant { path }
            | Self::DepthExceeded { path, .. }
            | Self::Custom { path, .. } => Some(path),
            Self::KindMismatch { .. } | Self::MissingId { .. } | Self::IdMismatch { .. } => None,
        }
    }
}

/// Convenience alias for translation results.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Errors raised while building schemas and registering translators.
///
/// These surface at registration time, never during a save or load.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// No translator is registered for a field's type.
    #[error("{class}.{field}: no translator registered for {type_name}")]
    NoTranslator {
        class: String,
        field: String,
        type_name: &'static str,
    },

    /// A composite translator needs a translator for a type that has none.
    #[error("no translator registered for {type_name}")]
    Unresolved { type_name: &'static str },

    /// Two fields of one class share a stored name.
    #[error("{class}: duplicate field {field:?}")]
    DuplicateField { class: String, field: String },

    #[error("{class}: field name must not be empty")]
    EmptyFieldName { class: String },

    /// The name is reserved for internal properties.
    #[error("{class}: field name {field:?} is reserved")]
    ReservedName { class: String, field: String },

    /// A field option was applied before any field was declared.
    #[error("{class}: field option given before any field")]
    OptionWithoutField { class: String },

    #[error("duplicate variant {name:?}")]
    DuplicateVariant { name: String },

    #[error("polymorphic type {type_name} has no variants")]
    NoVariants { type_name: &'static str },

    /// An entity schema was built without an id binding.
    #[error("{kind}: entity has no id field")]
    MissingId { kind: String },

    #[error("invalid kind: {kind:?}")]
    InvalidKind { kind: String },
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;
