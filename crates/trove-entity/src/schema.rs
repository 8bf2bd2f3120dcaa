//! Entity schemas: kind, key bindings, stored fields and lifecycle hooks.

use std::fmt;

use trove_translate::{
    ClassSchema, ClassSchemaBuilder, Property, SchemaError, SchemaResult, Translator, Translators,
};
use trove_types::{validate_kind, Key, KeyId};

use crate::id::IdValue;

type Hook<E> = Box<dyn Fn(&mut E) + Send + Sync>;

/// Reads and writes the id field of `E`.
pub(crate) trait IdBinding<E>: Send + Sync {
    fn key_id(&self, entity: &E) -> Option<KeyId>;

    fn allocatable(&self) -> bool;

    fn expected(&self) -> &'static str;

    /// Returns `false` if `id` does not fit the field.
    fn assign(&self, entity: &mut E, id: &KeyId) -> bool;
}

struct IdField<E, I> {
    get: Box<dyn Fn(&E) -> &I + Send + Sync>,
    get_mut: Box<dyn Fn(&mut E) -> &mut I + Send + Sync>,
}

impl<E, I: IdValue> IdBinding<E> for IdField<E, I> {
    fn key_id(&self, entity: &E) -> Option<KeyId> {
        (self.get)(entity).key_id()
    }

    fn allocatable(&self) -> bool {
        I::ALLOCATABLE
    }

    fn expected(&self) -> &'static str {
        I::EXPECTED
    }

    fn assign(&self, entity: &mut E, id: &KeyId) -> bool {
        match I::from_key_id(id) {
            Some(value) => {
                *(self.get_mut)(entity) = value;
                true
            }
            None => false,
        }
    }
}

/// Binds an `Option<Key>` field of `E` to the parent of its key.
pub(crate) struct ParentBinding<E> {
    get: Box<dyn Fn(&E) -> &Option<Key> + Send + Sync>,
    get_mut: Box<dyn Fn(&mut E) -> &mut Option<Key> + Send + Sync>,
}

impl<E> ParentBinding<E> {
    pub(crate) fn get<'e>(&self, entity: &'e E) -> Option<&'e Key> {
        (self.get)(entity).as_ref()
    }

    pub(crate) fn set(&self, entity: &mut E, parent: Option<Key>) {
        *(self.get_mut)(entity) = parent;
    }
}

/// Everything needed to store `E` as a record.
pub struct EntitySchema<E> {
    kind: String,
    class: ClassSchema<E>,
    id: Box<dyn IdBinding<E>>,
    parent: Option<ParentBinding<E>>,
    on_load: Vec<Hook<E>>,
    on_save: Vec<Hook<E>>,
}

impl<E: 'static> EntitySchema<E> {
    /// Start declaring an entity stored under `kind`.
    pub fn builder(kind: impl Into<String>, registry: &Translators) -> EntitySchemaBuilder<'_, E> {
        let kind = kind.into();
        EntitySchemaBuilder {
            class: ClassSchema::builder(kind.clone(), registry),
            kind,
            id: None,
            parent: None,
            on_load: Vec::new(),
            on_save: Vec::new(),
        }
    }
}

impl<E> EntitySchema<E> {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The stored fields.
    pub fn class(&self) -> &ClassSchema<E> {
        &self.class
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn id(&self) -> &dyn IdBinding<E> {
        self.id.as_ref()
    }

    pub(crate) fn parent(&self) -> Option<&ParentBinding<E>> {
        self.parent.as_ref()
    }

    pub(crate) fn run_on_load(&self, entity: &mut E) {
        for hook in &self.on_load {
            hook(entity);
        }
    }

    pub(crate) fn run_on_save(&self, entity: &mut E) {
        for hook in &self.on_save {
            hook(entity);
        }
    }
}

impl<E> fmt::Debug for EntitySchema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("kind", &self.kind)
            .field("class", &self.class)
            .field("parent", &self.parent.is_some())
            .field("on_load", &self.on_load.len())
            .field("on_save", &self.on_save.len())
            .finish()
    }
}

/// Builder for [`EntitySchema`].
///
/// Field declarations and options behave as on [`ClassSchemaBuilder`].
pub struct EntitySchemaBuilder<'r, E> {
    kind: String,
    class: ClassSchemaBuilder<'r, E>,
    id: Option<Box<dyn IdBinding<E>>>,
    parent: Option<ParentBinding<E>>,
    on_load: Vec<Hook<E>>,
    on_save: Vec<Hook<E>>,
}

impl<'r, E: 'static> EntitySchemaBuilder<'r, E> {
    /// Bind the key's id to a field. The id is not stored as a property.
    pub fn id<I, G, M>(mut self, get: G, get_mut: M) -> Self
    where
        I: IdValue,
        G: Fn(&E) -> &I + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut I + Send + Sync + 'static,
    {
        self.id = Some(Box::new(IdField {
            get: Box::new(get),
            get_mut: Box::new(get_mut),
        }));
        self
    }

    /// Bind the key's parent to an `Option<Key>` field.
    pub fn parent<G, M>(mut self, get: G, get_mut: M) -> Self
    where
        G: Fn(&E) -> &Option<Key> + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut Option<Key> + Send + Sync + 'static,
    {
        self.parent = Some(ParentBinding {
            get: Box::new(get),
            get_mut: Box::new(get_mut),
        });
        self
    }

    pub fn field<P, G, M>(mut self, name: &str, get: G, get_mut: M) -> Self
    where
        P: 'static,
        G: Fn(&E) -> &P + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut P + Send + Sync + 'static,
    {
        self.class = self.class.field(name, get, get_mut);
        self
    }

    pub fn field_with<P, G, M, T>(mut self, name: &str, get: G, get_mut: M, translator: T) -> Self
    where
        P: 'static,
        G: Fn(&E) -> &P + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut P + Send + Sync + 'static,
        T: Translator<P> + 'static,
    {
        self.class = self.class.field_with(name, get, get_mut, translator);
        self
    }

    pub fn property(mut self, name: &str, property: impl Property<E> + 'static) -> Self {
        self.class = self.class.property(name, property);
        self
    }

    pub fn also_load(mut self, name: &str) -> Self {
        self.class = self.class.also_load(name);
        self
    }

    pub fn ignore_save(mut self) -> Self {
        self.class = self.class.ignore_save();
        self
    }

    pub fn ignore_load(mut self) -> Self {
        self.class = self.class.ignore_load();
        self
    }

    /// Run `hook` after every load, once all fields are assigned.
    pub fn on_load(mut self, hook: impl Fn(&mut E) + Send + Sync + 'static) -> Self {
        self.on_load.push(Box::new(hook));
        self
    }

    /// Run `hook` before every save through the SDK.
    pub fn on_save(mut self, hook: impl Fn(&mut E) + Send + Sync + 'static) -> Self {
        self.on_save.push(Box::new(hook));
        self
    }

    pub fn build(self) -> SchemaResult<EntitySchema<E>> {
        validate_kind(&self.kind).map_err(|_| SchemaError::InvalidKind {
            kind: self.kind.clone(),
        })?;
        let id = self.id.ok_or_else(|| SchemaError::MissingId {
            kind: self.kind.clone(),
        })?;
        Ok(EntitySchema {
            class: self.class.build()?,
            kind: self.kind,
            id,
            parent: self.parent,
            on_load: self.on_load,
            on_save: self.on_save,
        })
    }
}
