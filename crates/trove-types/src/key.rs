use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The identifying part of a [`Key`]: either a numeric id or a string name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyId {
    /// Numeric id, usually allocated by the store.
    Int(i64),
    /// Application-chosen string name.
    Name(String),
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name:?}"),
        }
    }
}

impl From<i64> for KeyId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for KeyId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Entity key as understood by the storage boundary.
///
/// A key without an id is *incomplete*: the store is expected to allocate one
/// when a record carrying it is written.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    kind: String,
    id: Option<KeyId>,
    parent: Option<Box<Key>>,
}

impl Key {
    /// Create a complete key.
    pub fn new(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
            parent: None,
        }
    }

    /// Create a key that still needs an id from the store.
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            parent: None,
        }
    }

    /// Validate and build a key from its parts.
    pub fn try_new(
        kind: impl Into<String>,
        id: Option<KeyId>,
        parent: Option<Key>,
    ) -> Result<Self, TypeError> {
        let kind = kind.into();
        validate_kind(&kind)?;
        if let Some(KeyId::Name(name)) = &id {
            if name.is_empty() {
                return Err(TypeError::InvalidKeyName(name.clone()));
            }
        }
        Ok(Self {
            kind,
            id,
            parent: parent.map(Box::new),
        })
    }

    /// Attach a parent key.
    pub fn with_parent(mut self, parent: Key) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Return a copy of this key completed with `id`.
    pub fn with_id(&self, id: impl Into<KeyId>) -> Self {
        Self {
            kind: self.kind.clone(),
            id: Some(id.into()),
            parent: self.parent.clone(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> Option<&KeyId> {
        self.id.as_ref()
    }

    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// Returns `true` if the key carries an id.
    pub fn is_complete(&self) -> bool {
        self.id.is_some()
    }

    /// Error unless the key is complete.
    pub fn require_complete(&self) -> Result<&KeyId, TypeError> {
        self.id.as_ref().ok_or_else(|| TypeError::IncompleteKey {
            key: self.to_string(),
        })
    }
}

/// Kinds must be non-empty and free of the characters used in key display.
pub fn validate_kind(kind: &str) -> Result<(), TypeError> {
    if kind.is_empty() || kind.contains(['/', '(', ')']) || kind.trim() != kind {
        return Err(TypeError::InvalidKind(kind.to_string()));
    }
    Ok(())
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.parent {
            write!(f, "{parent}/")?;
        }
        match &self.id {
            Some(id) => write!(f, "{}({id})", self.kind),
            None => write!(f, "{}(?)", self.kind),
        }
    }
}
