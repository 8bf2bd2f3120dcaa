use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use trove_entity::{EntityMapper, EntitySchema};
use trove_store::RecordStore;
use trove_translate::Translators;
use trove_types::{Key, Record};

use crate::config::SdkConfig;
use crate::error::{SdkError, SdkResult};

/// Saves and loads registered entity types against a [`RecordStore`].
pub struct Trove {
    store: Arc<dyn RecordStore>,
    config: SdkConfig,
    /// `EntityMapper<E>` per entity type.
    mappers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    kinds: HashMap<String, &'static str>,
}

impl Trove {
    pub fn new(store: Arc<dyn RecordStore>, config: SdkConfig) -> Self {
        Self {
            store,
            config,
            mappers: HashMap::new(),
            kinds: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// A translator registry seeded with this instance's translate config.
    pub fn translators(&self) -> Translators {
        Translators::with_config(self.config.translate.clone())
    }

    /// Register the schema for entity type `E`.
    pub fn register<E: 'static>(&mut self, schema: EntitySchema<E>) -> SdkResult<()> {
        let kind = schema.kind().to_string();
        match self.kinds.get(&kind) {
            Some(owner) if *owner != type_name::<E>() => return Err(SdkError::DuplicateKind(kind)),
            _ => {}
        }
        let mapper = EntityMapper::new(Arc::new(schema), self.config.translate.clone());
        self.mappers.insert(TypeId::of::<E>(), Box::new(mapper));
        // A type owns only the kind of its latest schema.
        self.kinds.retain(|_, owner| *owner != type_name::<E>());
        self.kinds.insert(kind.clone(), type_name::<E>());
        debug!(kind, entity = type_name::<E>(), "schema registered");
        Ok(())
    }

    pub fn is_registered<E: 'static>(&self) -> bool {
        self.mappers.contains_key(&TypeId::of::<E>())
    }

    pub fn mapper<E: 'static>(&self) -> SdkResult<&EntityMapper<E>> {
        self.mappers
            .get(&TypeId::of::<E>())
            .and_then(|m| m.downcast_ref::<EntityMapper<E>>())
            .ok_or(SdkError::UnregisteredKind(type_name::<E>()))
    }

    // ---- Save ----

    /// Save `entity` and return its key.
    ///
    /// Runs the `on_save` hooks first. When the store allocates an id, it is
    /// written back into `entity`.
    pub fn save<E: 'static>(&self, entity: &mut E) -> SdkResult<Key> {
        let mapper = self.mapper::<E>()?;
        mapper.before_save(entity);
        let translated = mapper.save(entity)?;
        let key = self.store.put(&translated.record)?;
        mapper.assign_key(entity, &key)?;
        translated.complete(&key);
        debug!(%key, "entity stored");
        Ok(key)
    }

    /// Save each entity in turn, returning one result per input.
    ///
    /// With `stop_batch_on_error`, entities after the first failure are not
    /// saved and report [`SdkError::BatchAborted`].
    pub fn save_all<E: 'static>(&self, entities: &mut [E]) -> Vec<SdkResult<Key>> {
        let mut results = Vec::with_capacity(entities.len());
        let mut failed = None;
        for (index, entity) in entities.iter_mut().enumerate() {
            if let Some(index) = failed {
                results.push(Err(SdkError::BatchAborted { index }));
                continue;
            }
            let result = self.save(entity);
            if let Err(err) = &result {
                warn!(index, error = %err, "batch save failed");
                if self.config.stop_batch_on_error {
                    failed = Some(index);
                }
            }
            results.push(result);
        }
        results
    }

    /// Translate `entity` without storing it. Key listeners are not fired.
    pub fn to_record<E: 'static>(&self, entity: &E) -> SdkResult<Record> {
        Ok(self.mapper::<E>()?.save(entity)?.record)
    }

    pub fn key_of<E: 'static>(&self, entity: &E) -> SdkResult<Key> {
        Ok(self.mapper::<E>()?.key_of(entity)?)
    }

    // ---- Load ----

    /// Load the entity stored under `key` into a fresh value.
    ///
    /// `key` must be complete; an incomplete key is [`SdkError::Types`].
    pub fn load<E: Default + 'static>(&self, key: &Key) -> SdkResult<Option<E>> {
        let mapper = self.mapper::<E>()?;
        key.require_complete()?;
        match self.store.get(key)? {
            Some(record) => Ok(Some(mapper.load(&record)?)),
            None => Ok(None),
        }
    }

    /// Load the entity stored under `key` into `entity`, reusing its values.
    ///
    /// Returns `false`, leaving `entity` untouched, if nothing is stored there.
    pub fn load_into<E: 'static>(&self, key: &Key, entity: &mut E) -> SdkResult<bool> {
        let mapper = self.mapper::<E>()?;
        key.require_complete()?;
        let Some(record) = self.store.get(key)? else {
            return Ok(false);
        };
        mapper.load_into(&record, entity)?;
        Ok(true)
    }

    // ---- Delete ----

    /// Delete the record under `key`. Returns `true` if it existed.
    pub fn delete(&self, key: &Key) -> SdkResult<bool> {
        key.require_complete()?;
        let existed = self.store.delete(key)?;
        debug!(%key, existed, "entity deleted");
        Ok(existed)
    }
}

impl std::fmt::Debug for Trove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("Trove")
            .field("config", &self.config)
            .field("kinds", &kinds)
            .finish()
    }
}
