use trove_types::KeyId;

/// Rust types usable as an entity id.
///
/// `Option<i64>` ids may be left empty on save; the store allocates one and
/// it is written back after the save. Every other id type must be set.
pub trait IdValue: Send + Sync + Sized + 'static {
    /// Whether an empty id can be filled in by the store.
    const ALLOCATABLE: bool;

    /// Shown in errors when a key's id does not fit.
    const EXPECTED: &'static str;

    /// The key id, or `None` if the field is empty.
    fn key_id(&self) -> Option<KeyId>;

    /// Convert a key id back; `None` if it has the wrong form.
    fn from_key_id(id: &KeyId) -> Option<Self>;
}

impl IdValue for i64 {
    const ALLOCATABLE: bool = false;
    const EXPECTED: &'static str = "integer id";

    fn key_id(&self) -> Option<KeyId> {
        Some(KeyId::Int(*self))
    }

    fn from_key_id(id: &KeyId) -> Option<Self> {
        match id {
            KeyId::Int(id) => Some(*id),
            KeyId::Name(_) => None,
        }
    }
}

impl IdValue for Option<i64> {
    const ALLOCATABLE: bool = true;
    const EXPECTED: &'static str = "integer id";

    fn key_id(&self) -> Option<KeyId> {
        self.map(KeyId::Int)
    }

    fn from_key_id(id: &KeyId) -> Option<Self> {
        i64::from_key_id(id).map(Some)
    }
}

impl IdValue for String {
    const ALLOCATABLE: bool = false;
    const EXPECTED: &'static str = "string name";

    /// An empty string counts as no id.
    fn key_id(&self) -> Option<KeyId> {
        (!self.is_empty()).then(|| KeyId::Name(self.clone()))
    }

    fn from_key_id(id: &KeyId) -> Option<Self> {
        match id {
            KeyId::Name(name) => Some(name.clone()),
            KeyId::Int(_) => None,
        }
    }
}

impl IdValue for Option<String> {
    const ALLOCATABLE: bool = false;
    const EXPECTED: &'static str = "string name";

    fn key_id(&self) -> Option<KeyId> {
        self.as_ref().and_then(String::key_id)
    }

    fn from_key_id(id: &KeyId) -> Option<Self> {
        String::from_key_id(id).map(Some)
    }
}
