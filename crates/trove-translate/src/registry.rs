//! Type-indexed translator registry.
//!
//! Schemas resolve each field's translator here once, when they are built.
//! Composite translators (lists, options, maps) are registered explicitly
//! from their element type, which must already be registered.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;
use trove_types::Key;

use crate::class::{ClassSchema, ClassTranslator};
use crate::collection::{ListTranslator, SetTranslator};
use crate::config::{NullPolicy, TranslateConfig};
use crate::error::{SchemaError, SchemaResult};
use crate::map::MapTranslator;
use crate::nullable::Nullable;
use crate::scalar::{
    BlobCodec, BoolCodec, DoubleCodec, EnumTranslator, IntCodec, KeyCodec, Scalar, StringCodec,
    TimestampCodec,
};
use crate::translator::{Recycling, Translator};

struct Entry {
    type_name: &'static str,
    /// Always an `Arc<dyn Translator<P>>` for the entry's type.
    translator: Box<dyn Any + Send + Sync>,
}

/// Translators keyed by the Rust type they handle.
pub struct Translators {
    config: TranslateConfig,
    entries: HashMap<TypeId, Entry>,
}

impl Translators {
    /// A registry with the built-in scalar translators and default config.
    pub fn new() -> Self {
        Self::with_config(TranslateConfig::default())
    }

    /// A registry with the built-in scalar translators.
    pub fn with_config(config: TranslateConfig) -> Self {
        let mut registry = Self::empty(config);
        registry.register::<String, _>(Scalar(StringCodec));
        registry.register::<i64, _>(Scalar(IntCodec));
        registry.register::<i32, _>(Scalar(IntCodec));
        registry.register::<f64, _>(Scalar(DoubleCodec));
        registry.register::<bool, _>(Scalar(BoolCodec));
        registry.register::<Bytes, _>(Scalar(BlobCodec));
        registry.register::<Key, _>(Scalar(KeyCodec));
        registry.register::<DateTime<Utc>, _>(Scalar(TimestampCodec));
        registry
    }

    /// A registry with no translators at all.
    pub fn empty(config: TranslateConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register `translator` for `P`, replacing any earlier registration.
    pub fn register<P, T>(&mut self, translator: T)
    where
        P: 'static,
        T: Translator<P> + 'static,
    {
        self.register_arc::<P>(Arc::new(translator));
    }

    pub fn register_arc<P: 'static>(&mut self, translator: Arc<dyn Translator<P>>) {
        let replaced = self
            .entries
            .insert(
                TypeId::of::<P>(),
                Entry {
                    type_name: type_name::<P>(),
                    translator: Box::new(translator),
                },
            )
            .is_some();
        debug!(type_name = type_name::<P>(), replaced, "translator registered");
    }

    pub fn get<P: 'static>(&self) -> Option<Arc<dyn Translator<P>>> {
        self.entries
            .get(&TypeId::of::<P>())
            .and_then(|entry| entry.translator.downcast_ref::<Arc<dyn Translator<P>>>())
            .cloned()
    }

    pub fn contains<P: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<P>())
    }

    /// The translator for `P`, or [`SchemaError::Unresolved`].
    pub fn resolve<P: 'static>(&self) -> SchemaResult<Arc<dyn Translator<P>>> {
        self.get::<P>().ok_or(SchemaError::Unresolved {
            type_name: type_name::<P>(),
        })
    }

    /// The translator for field `field` of `class`, or [`SchemaError::NoTranslator`].
    pub fn resolve_field<P: 'static>(&self, class: &str, field: &str) -> SchemaResult<Arc<dyn Translator<P>>> {
        self.get::<P>().ok_or_else(|| SchemaError::NoTranslator {
            class: class.to_string(),
            field: field.to_string(),
            type_name: type_name::<P>(),
        })
    }

    /// Register `Vec<P>` using the translator registered for `P`.
    pub fn register_list<P: 'static>(&mut self) -> SchemaResult<()> {
        let element = self.resolve::<P>()?;
        self.register::<Vec<P>, _>(Recycling(ListTranslator::new(element)));
        Ok(())
    }

    /// Register `BTreeSet<P>` using the translator registered for `P`.
    pub fn register_set<P: Ord + 'static>(&mut self) -> SchemaResult<()> {
        let element = self.resolve::<P>()?;
        self.register::<BTreeSet<P>, _>(Recycling(SetTranslator::new(element)));
        Ok(())
    }

    /// Register `BTreeMap<String, P>` using the translator registered for `P`.
    pub fn register_map<P: 'static>(&mut self) -> SchemaResult<()> {
        let value = self.resolve::<P>()?;
        self.register::<BTreeMap<String, P>, _>(Recycling(MapTranslator::new(value)));
        Ok(())
    }

    /// Register `Option<P>` with the configured [`NullPolicy`].
    pub fn register_option<P: 'static>(&mut self) -> SchemaResult<()> {
        self.register_option_with::<P>(self.config.null_policy)
    }

    pub fn register_option_with<P: 'static>(&mut self, policy: NullPolicy) -> SchemaResult<()> {
        let inner = self.resolve::<P>()?;
        self.register::<Option<P>, _>(Nullable::new(inner, policy));
        Ok(())
    }

    /// Register `E` as an embedded struct described by `schema`.
    pub fn register_embedded<E>(&mut self, schema: Arc<ClassSchema<E>>)
    where
        E: Default + Send + Sync + 'static,
    {
        self.register::<E, _>(ClassTranslator::recycling(schema));
    }

    /// Register a fieldless enum stored by variant name.
    pub fn register_enum<P>(&mut self, to_name: fn(&P) -> &'static str, from_name: fn(&str) -> Option<P>)
    where
        P: PartialEq + Send + Sync + 'static,
    {
        self.register::<P, _>(EnumTranslator::enumeration(to_name, from_name));
    }
}

impl Default for Translators {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Translators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.entries.values().map(|e| e.type_name).collect();
        types.sort_unstable();
        f.debug_struct("Translators")
            .field("config", &self.config)
            .field("types", &types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LoadContext, SaveContext};
    use crate::outcome::Outcome;
    use trove_types::{Path, Value};

    #[test]
    fn builtins_are_registered() {
        let registry = Translators::new();
        assert!(registry.contains::<String>());
        assert!(registry.contains::<i64>());
        assert!(registry.contains::<i32>());
        assert!(registry.contains::<f64>());
        assert!(registry.contains::<bool>());
        assert!(registry.contains::<Bytes>());
        assert!(registry.contains::<Key>());
        assert!(registry.contains::<DateTime<Utc>>());
        assert!(!registry.contains::<Vec<String>>());
        assert_eq!(registry.len(), 8);
        assert!(Translators::empty(TranslateConfig::default()).is_empty());
    }

    #[test]
    fn composite_requires_element() {
        let mut registry = Translators::new();
        let err = registry.register_list::<u8>().unwrap_err();
        assert_eq!(err, SchemaError::Unresolved { type_name: "u8" });

        registry.register_list::<String>().unwrap();
        registry.register_option::<Vec<String>>().unwrap();
        assert!(registry.contains::<Option<Vec<String>>>());
    }

    #[test]
    fn field_resolution_names_field() {
        let registry = Translators::new();
        let err = registry.resolve_field::<u16>("Person", "age").err().unwrap();
        assert_eq!(err.to_string(), "Person.age: no translator registered for u16");
    }

    #[test]
    fn option_uses_configured_policy() {
        let config = TranslateConfig {
            null_policy: NullPolicy::Omit,
            ..Default::default()
        };
        let mut registry = Translators::with_config(config.clone());
        registry.register_option::<String>().unwrap();
        let t = registry.get::<Option<String>>().unwrap();

        let mut ctx = SaveContext::new(config);
        assert!(t.save(&None, &mut ctx, &Path::of("nick")).unwrap().is_skip());
    }

    #[test]
    fn later_registration_replaces() {
        struct Shout;
        impl Translator<String> for Shout {
            fn save(&self, value: &String, _: &mut SaveContext, _: &Path) -> crate::TranslateResult<Outcome<Value>> {
                Ok(Outcome::Assign(Value::String(value.to_uppercase())))
            }
            fn load(
                &self,
                node: Option<&Value>,
                _: &mut LoadContext<'_>,
                _: &Path,
                _: Option<&mut String>,
            ) -> crate::TranslateResult<Outcome<String>> {
                Ok(node
                    .and_then(Value::as_str)
                    .map(|s| Outcome::Assign(s.to_lowercase()))
                    .unwrap_or(Outcome::Skip))
            }
        }

        let mut registry = Translators::new();
        registry.register::<String, _>(Shout);
        let t = registry.get::<String>().unwrap();
        let mut ctx = SaveContext::new(TranslateConfig::default());
        assert_eq!(
            t.save(&"hi".to_string(), &mut ctx, &Path::root()).unwrap(),
            Outcome::Assign(Value::from("HI"))
        );
    }

    #[test]
    fn maps_and_sets_register() {
        let mut registry = Translators::new();
        registry.register_map::<i64>().unwrap();
        registry.register_set::<String>().unwrap();
        assert!(registry.contains::<BTreeMap<String, i64>>());
        assert!(registry.contains::<BTreeSet<String>>());
        let debug = format!("{registry:?}");
        assert!(debug.contains("alloc::string::String"));
    }
}
