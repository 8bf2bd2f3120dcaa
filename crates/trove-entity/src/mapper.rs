//! Top-level save and load of one entity.

use std::sync::Arc;

use tracing::{debug, trace};
use trove_translate::{
    KeyListeners, LoadContext, Outcome, RecycleStats, SaveContext, TranslateConfig,
    TranslateError, TranslateResult,
};
use trove_types::{Key, Path, Record};

use crate::schema::EntitySchema;

/// The record produced by a save, plus callbacks waiting for its final key.
#[derive(Debug)]
pub struct TranslatedEntity {
    pub record: Record,
    listeners: KeyListeners,
}

impl TranslatedEntity {
    /// Number of callbacks waiting for the key.
    pub fn pending_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Fire the key listeners with the key the store produced and return
    /// the record under that key.
    pub fn complete(self, key: &Key) -> Record {
        self.listeners.fire(key);
        Record {
            key: key.clone(),
            ..self.record
        }
    }
}

/// What a load changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Stored names of the fields that were assigned, in declaration order.
    pub assigned: Vec<String>,
    pub stats: RecycleStats,
}

impl LoadReport {
    /// Returns `true` if any field was assigned.
    pub fn changed(&self) -> bool {
        !self.assigned.is_empty()
    }
}

/// Saves and loads entities of one kind.
pub struct EntityMapper<E> {
    schema: Arc<EntitySchema<E>>,
    config: TranslateConfig,
}

impl<E> Clone for EntityMapper<E> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            config: self.config.clone(),
        }
    }
}

impl<E> EntityMapper<E> {
    pub fn new(schema: Arc<EntitySchema<E>>, config: TranslateConfig) -> Self {
        Self { schema, config }
    }

    pub fn kind(&self) -> &str {
        self.schema.kind()
    }

    pub fn schema(&self) -> &Arc<EntitySchema<E>> {
        &self.schema
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// The key `entity` would be stored under.
    ///
    /// An empty allocatable id gives an incomplete key.
    pub fn key_of(&self, entity: &E) -> TranslateResult<Key> {
        let id = self.schema.id();
        let mut key = match id.key_id(entity) {
            Some(key_id) => Key::new(self.kind(), key_id),
            None if id.allocatable() => Key::incomplete(self.kind()),
            None => {
                return Err(TranslateError::MissingId {
                    kind: self.kind().to_string(),
                })
            }
        };
        if let Some(parent) = self.schema.parent().and_then(|p| p.get(entity)) {
            key = key.with_parent(parent.clone());
        }
        Ok(key)
    }

    /// Run the schema's `on_save` hooks.
    pub fn before_save(&self, entity: &mut E) {
        self.schema.run_on_save(entity);
    }

    /// Translate `entity` into a record.
    ///
    /// Fields are saved in declaration order, deferred tasks run against the
    /// assembled record, and the key is produced last.
    pub fn save(&self, entity: &E) -> TranslateResult<TranslatedEntity> {
        let mut ctx = SaveContext::new(self.config.clone());
        let root = Path::root();

        let mut record = Record::new(Key::incomplete(self.kind()));
        for field in self.schema.class().fields() {
            match field.save(entity, &mut ctx, &root)? {
                Outcome::Assign(value) => {
                    record.set(field.name(), value);
                }
                Outcome::Skip => {
                    trace!(field = field.name(), "field omitted");
                }
            }
        }
        ctx.run_deferred(&mut record)?;
        record.key = self.key_of(entity)?;

        debug!(key = %record.key, properties = record.len(), "entity saved");
        Ok(TranslatedEntity {
            record,
            listeners: ctx.into_listeners(),
        })
    }

    /// Load `record` into a fresh entity.
    pub fn load(&self, record: &Record) -> TranslateResult<E>
    where
        E: Default,
    {
        let mut entity = E::default();
        self.load_into(record, &mut entity)?;
        Ok(entity)
    }

    /// Load `record` into an existing entity, recycling its field values.
    ///
    /// Fields missing from the record keep their current values. On error
    /// the load stops; fields assigned before the failure stay assigned.
    pub fn load_into(&self, record: &Record, entity: &mut E) -> TranslateResult<LoadReport> {
        if record.kind() != self.kind() {
            return Err(TranslateError::KindMismatch {
                expected: self.kind().to_string(),
                found: record.kind().to_string(),
            });
        }
        let mut ctx = LoadContext::for_record(self.config.clone(), record);
        self.apply_key(entity, &ctx)?;

        let root = Path::root();
        let mut assigned = Vec::new();
        for field in self.schema.class().fields() {
            if field.load(&record.properties, entity, &mut ctx, &root)? {
                assigned.push(field.name().to_string());
            }
        }
        ctx.run_deferred()?;
        self.schema.run_on_load(entity);

        let report = LoadReport {
            assigned,
            stats: ctx.stats(),
        };
        debug!(
            key = %record.key,
            assigned = report.assigned.len(),
            recycled = report.stats.recycled,
            "entity loaded"
        );
        Ok(report)
    }

    /// Write the id and parent of `key` into `entity`, typically after the
    /// store has allocated an id.
    pub fn assign_key(&self, entity: &mut E, key: &Key) -> TranslateResult<()> {
        if key.kind() != self.kind() {
            return Err(TranslateError::KindMismatch {
                expected: self.kind().to_string(),
                found: key.kind().to_string(),
            });
        }
        self.assign_id(entity, key)?;
        if let Some(parent) = self.schema.parent() {
            parent.set(entity, key.parent().cloned());
        }
        Ok(())
    }

    fn apply_key(&self, entity: &mut E, ctx: &LoadContext<'_>) -> TranslateResult<()> {
        let Some(record) = ctx.record() else {
            return Ok(());
        };
        self.assign_id(entity, &record.key)?;
        if let Some(parent) = self.schema.parent() {
            parent.set(entity, record.key.parent().cloned());
        }
        Ok(())
    }

    fn assign_id(&self, entity: &mut E, key: &Key) -> TranslateResult<()> {
        let Some(key_id) = key.id() else {
            return Ok(());
        };
        let id = self.schema.id();
        if !id.assign(entity, key_id) {
            return Err(TranslateError::IdMismatch {
                key: key.to_string(),
                expected: id.expected(),
            });
        }
        Ok(())
    }
}

impl<E> std::fmt::Debug for EntityMapper<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMapper")
            .field("kind", &self.kind())
            .field("config", &self.config)
            .finish()
    }
}
