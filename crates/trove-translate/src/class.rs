//! Field tables for structs and the translator for embedded structs.
//!
//! A [`ClassSchema`] is the ordered list of stored fields of one Rust struct.
//! It is built once with [`ClassSchema::builder`], resolving each field's
//! translator from a [`Translators`] registry, and is immutable afterwards.
//! Entity schemas wrap one for their top-level fields; [`ClassTranslator`]
//! uses one to store a struct as an embedded map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;
use trove_types::{Path, Value, ValueType};

use crate::context::{LoadContext, SaveContext};
use crate::error::{SchemaError, SchemaResult, TranslateError, TranslateResult};
use crate::outcome::{Outcome, Recycle};
use crate::registry::Translators;
use crate::translator::{Recycles, Recycling, Translator};

/// Stored names starting with this prefix are reserved for internal use.
const RESERVED_PREFIX: char = '^';

/// Moves one field of `E` in and out of the value model.
///
/// Implement this directly for computed properties; plain struct fields are
/// declared through [`ClassSchemaBuilder::field`].
pub trait Property<E>: Send + Sync {
    fn save(&self, owner: &E, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>>;

    /// Load `node` into `owner`. Returns `true` if the field was assigned.
    fn load(
        &self,
        node: Option<&Value>,
        owner: &mut E,
        ctx: &mut LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<bool>;
}

type Getter<E, P> = Box<dyn Fn(&E) -> &P + Send + Sync>;
type GetterMut<E, P> = Box<dyn Fn(&mut E) -> &mut P + Send + Sync>;

struct Accessor<E, P> {
    get: Getter<E, P>,
    get_mut: GetterMut<E, P>,
    translator: Arc<dyn Translator<P>>,
}

impl<E, P> Property<E> for Accessor<E, P> {
    fn save(&self, owner: &E, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>> {
        self.translator.save((self.get)(owner), ctx, path)
    }

    fn load(
        &self,
        node: Option<&Value>,
        owner: &mut E,
        ctx: &mut LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<bool> {
        let slot = (self.get_mut)(owner);
        let outcome = self.translator.load(node, ctx, path, Some(&mut *slot))?;
        Ok(outcome.assign_to(slot))
    }
}

/// Per-field settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Stored property name.
    pub name: String,
    /// Older property names consulted on load when `name` is missing.
    pub also_load: Vec<String>,
    /// Never written on save.
    pub ignore_save: bool,
    /// Never assigned on load.
    pub ignore_load: bool,
}

/// One declared field of a [`ClassSchema`].
pub struct Field<E> {
    options: FieldOptions,
    property: Box<dyn Property<E>>,
}

impl<E> Field<E> {
    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Find this field's stored value, falling back to `also_load` names.
    pub fn lookup<'v>(&self, properties: &'v BTreeMap<String, Value>) -> Option<&'v Value> {
        properties.get(&self.options.name).or_else(|| {
            self.options
                .also_load
                .iter()
                .find_map(|name| properties.get(name))
        })
    }

    /// Save this field of `owner`. `parent` is the path of the owner.
    pub fn save(&self, owner: &E, ctx: &mut SaveContext, parent: &Path) -> TranslateResult<Outcome<Value>> {
        if self.options.ignore_save {
            return Ok(Outcome::Skip);
        }
        self.property.save(owner, ctx, &parent.field(self.name()))
    }

    /// Load this field of `owner` from its parent's properties.
    pub fn load(
        &self,
        properties: &BTreeMap<String, Value>,
        owner: &mut E,
        ctx: &mut LoadContext<'_>,
        parent: &Path,
    ) -> TranslateResult<bool> {
        if self.options.ignore_load {
            return Ok(false);
        }
        let path = parent.field(self.name());
        let assigned = self.property.load(self.lookup(properties), owner, ctx, &path)?;
        trace!(%path, assigned, "field loaded");
        Ok(assigned)
    }
}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("options", &self.options).finish()
    }
}

/// Ordered stored fields of a struct.
pub struct ClassSchema<E> {
    name: String,
    fields: Vec<Field<E>>,
}

impl<E: 'static> ClassSchema<E> {
    /// Start declaring the fields of `E`, resolving translators from `registry`.
    pub fn builder(name: impl Into<String>, registry: &Translators) -> ClassSchemaBuilder<'_, E> {
        ClassSchemaBuilder {
            name: name.into(),
            registry,
            fields: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<E> ClassSchema<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field<E>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<E>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Translate every field of `owner` in declaration order; skipped
    /// fields are left out of the result.
    pub fn save_fields(
        &self,
        owner: &E,
        ctx: &mut SaveContext,
        path: &Path,
    ) -> TranslateResult<BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();
        for field in &self.fields {
            if let Outcome::Assign(value) = field.save(owner, ctx, path)? {
                out.insert(field.name().to_string(), value);
            }
        }
        Ok(out)
    }

    /// Load every field of `owner`. Returns `true` if any field was assigned.
    ///
    /// Stops at the first error; fields assigned before it keep their values.
    pub fn load_fields(
        &self,
        properties: &BTreeMap<String, Value>,
        owner: &mut E,
        ctx: &mut LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<bool> {
        let mut changed = false;
        for field in &self.fields {
            changed |= field.load(properties, owner, ctx, path)?;
        }
        Ok(changed)
    }
}

impl<E> fmt::Debug for ClassSchema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`ClassSchema`].
///
/// Errors are collected and reported by [`build`](Self::build), so a chain
/// of declarations can be written without intermediate `?`.
pub struct ClassSchemaBuilder<'r, E> {
    name: String,
    registry: &'r Translators,
    fields: Vec<Field<E>>,
    errors: Vec<SchemaError>,
}

impl<'r, E: 'static> ClassSchemaBuilder<'r, E> {
    /// Declare a field whose translator is looked up by type.
    pub fn field<P, G, M>(mut self, name: &str, get: G, get_mut: M) -> Self
    where
        P: 'static,
        G: Fn(&E) -> &P + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut P + Send + Sync + 'static,
    {
        match self.registry.resolve_field::<P>(&self.name, name) {
            Ok(translator) => self.push_accessor(name, get, get_mut, translator),
            Err(err) => {
                self.errors.push(err);
                self
            }
        }
    }

    /// Declare a field with an explicit translator.
    pub fn field_with<P, G, M, T>(self, name: &str, get: G, get_mut: M, translator: T) -> Self
    where
        P: 'static,
        G: Fn(&E) -> &P + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut P + Send + Sync + 'static,
        T: Translator<P> + 'static,
    {
        self.push_accessor(name, get, get_mut, Arc::new(translator))
    }

    /// Declare a computed field.
    pub fn property(self, name: &str, property: impl Property<E> + 'static) -> Self {
        self.push(name, Box::new(property))
    }

    /// Also load the last declared field from `name` when its own property is missing.
    pub fn also_load(mut self, name: &str) -> Self {
        if let Some(options) = self.last_options() {
            options.also_load.push(name.to_string());
        }
        self
    }

    /// Never write the last declared field.
    pub fn ignore_save(mut self) -> Self {
        if let Some(options) = self.last_options() {
            options.ignore_save = true;
        }
        self
    }

    /// Never assign the last declared field on load.
    pub fn ignore_load(mut self) -> Self {
        if let Some(options) = self.last_options() {
            options.ignore_load = true;
        }
        self
    }

    pub fn build(self) -> SchemaResult<ClassSchema<E>> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        Ok(ClassSchema {
            name: self.name,
            fields: self.fields,
        })
    }

    fn last_options(&mut self) -> Option<&mut FieldOptions> {
        if self.fields.is_empty() {
            // An earlier declaration may have failed; report that one instead.
            if self.errors.is_empty() {
                self.errors.push(SchemaError::OptionWithoutField {
                    class: self.name.clone(),
                });
            }
            return None;
        }
        self.fields.last_mut().map(|field| &mut field.options)
    }

    fn push_accessor<P, G, M>(
        self,
        name: &str,
        get: G,
        get_mut: M,
        translator: Arc<dyn Translator<P>>,
    ) -> Self
    where
        P: 'static,
        G: Fn(&E) -> &P + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut P + Send + Sync + 'static,
    {
        let accessor = Accessor {
            get: Box::new(get),
            get_mut: Box::new(get_mut),
            translator,
        };
        self.push(name, Box::new(accessor))
    }

    fn push(mut self, name: &str, property: Box<dyn Property<E>>) -> Self {
        let class = self.name.clone();
        if name.is_empty() {
            self.errors.push(SchemaError::EmptyFieldName { class });
        } else if name.starts_with(RESERVED_PREFIX) {
            self.errors.push(SchemaError::ReservedName {
                class,
                field: name.to_string(),
            });
        } else if self.fields.iter().any(|f| f.name() == name) {
            self.errors.push(SchemaError::DuplicateField {
                class,
                field: name.to_string(),
            });
        } else {
            self.fields.push(Field {
                options: FieldOptions {
                    name: name.to_string(),
                    ..FieldOptions::default()
                },
                property,
            });
        }
        self
    }
}

/// Stores a struct as an embedded map using its [`ClassSchema`].
///
/// On load, an existing struct at the destination is updated field by field;
/// otherwise `E::default()` is populated.
pub struct ClassTranslator<E> {
    schema: Arc<ClassSchema<E>>,
}

impl<E> ClassTranslator<E> {
    pub fn new(schema: Arc<ClassSchema<E>>) -> Self {
        Self { schema }
    }

    /// The recycling translator for `E`.
    pub fn recycling(schema: Arc<ClassSchema<E>>) -> Recycling<Self> {
        Recycling(Self::new(schema))
    }

    pub fn schema(&self) -> &Arc<ClassSchema<E>> {
        &self.schema
    }
}

impl<E> Clone for ClassTranslator<E> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<E> Recycles<E> for ClassTranslator<E>
where
    E: Default + Send + Sync,
{
    fn stored_as(&self) -> ValueType {
        ValueType::Map
    }

    fn save(&self, value: &E, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>> {
        ctx.enter(path)?;
        let properties = self.schema.save_fields(value, ctx, path)?;
        Ok(Outcome::Assign(Value::Map(properties)))
    }

    fn load_into(
        &self,
        node: &Value,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut E>,
    ) -> TranslateResult<Recycle<E>> {
        let properties = node
            .as_map()
            .ok_or_else(|| TranslateError::mismatch(path, ValueType::Map, node.value_type()))?;
        ctx.enter(path)?;

        match into {
            Some(target) => {
                if self.schema.load_fields(properties, target, ctx, path)? {
                    Ok(Recycle::Changed(std::mem::take(target)))
                } else {
                    Ok(Recycle::Unchanged)
                }
            }
            None => {
                let mut fresh = E::default();
                self.schema.load_fields(properties, &mut fresh, ctx, path)?;
                Ok(Recycle::Changed(fresh))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateConfig;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Address {
        street: String,
        zip: i64,
        lines: Vec<String>,
    }

    fn registry() -> Translators {
        let mut registry = Translators::new();
        registry.register_list::<String>().unwrap();
        registry
    }

    fn address_schema(registry: &Translators) -> Arc<ClassSchema<Address>> {
        Arc::new(
            ClassSchema::builder("Address", registry)
                .field("street", |a: &Address| &a.street, |a: &mut Address| &mut a.street)
                .also_load("road")
                .field("zip", |a: &Address| &a.zip, |a: &mut Address| &mut a.zip)
                .field("lines", |a: &Address| &a.lines, |a: &mut Address| &mut a.lines)
                .build()
                .unwrap(),
        )
    }

    fn sample() -> Address {
        Address {
            street: "Main".into(),
            zip: 12345,
            lines: vec!["c/o Ann".into()],
        }
    }

    fn save(t: &Recycling<ClassTranslator<Address>>, value: &Address) -> Value {
        let mut ctx = SaveContext::new(TranslateConfig::default());
        t.save(value, &mut ctx, &Path::of("addr"))
            .unwrap()
            .into_option()
            .unwrap()
    }

    #[test]
    fn fields_keep_declaration_order() {
        let registry = registry();
        let schema = address_schema(&registry);
        let names: Vec<&str> = schema.fields().iter().map(Field::name).collect();
        assert_eq!(names, vec!["street", "zip", "lines"]);
        assert_eq!(schema.field("zip").unwrap().options().also_load, Vec::<String>::new());
        assert_eq!(schema.field("street").unwrap().options().also_load, vec!["road"]);
    }

    #[test]
    fn embedded_roundtrip() {
        let registry = registry();
        let t = ClassTranslator::recycling(address_schema(&registry));
        let stored = save(&t, &sample());

        let mut ctx = LoadContext::new(TranslateConfig::default());
        let loaded = t.load(Some(&stored), &mut ctx, &Path::of("addr"), None).unwrap();
        assert_eq!(loaded, Outcome::Assign(sample()));
    }

    #[test]
    fn empty_embedded_list_is_omitted() {
        let registry = registry();
        let t = ClassTranslator::recycling(address_schema(&registry));
        let stored = save(
            &t,
            &Address {
                lines: Vec::new(),
                ..sample()
            },
        );
        let map = stored.as_map().unwrap();
        assert!(!map.contains_key("lines"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn unchanged_embedded_reload_is_skip() {
        let registry = registry();
        let t = ClassTranslator::recycling(address_schema(&registry));
        let stored = save(&t, &sample());

        let mut target = sample();
        let lines_ptr = target.lines.as_ptr();
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let out = t
            .load(Some(&stored), &mut ctx, &Path::of("addr"), Some(&mut target))
            .unwrap();
        assert!(out.is_skip());
        assert_eq!(target.lines.as_ptr(), lines_ptr);
    }

    #[test]
    fn changed_embedded_reload_assigns() {
        let registry = registry();
        let t = ClassTranslator::recycling(address_schema(&registry));
        let stored = save(&t, &sample());

        let mut target = Address {
            zip: 1,
            ..sample()
        };
        let lines_ptr = target.lines.as_ptr();
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let Outcome::Assign(loaded) = t
            .load(Some(&stored), &mut ctx, &Path::of("addr"), Some(&mut target))
            .unwrap()
        else {
            panic!("changed struct must be assigned");
        };
        assert_eq!(loaded, sample());
        assert_eq!(loaded.lines.as_ptr(), lines_ptr);
    }

    #[test]
    fn also_load_reads_old_name() {
        let registry = registry();
        let t = ClassTranslator::recycling(address_schema(&registry));
        let mut old = BTreeMap::new();
        old.insert("road".to_string(), Value::from("Elm"));

        let mut ctx = LoadContext::new(TranslateConfig::default());
        let out = t
            .load(Some(&Value::Map(old)), &mut ctx, &Path::of("addr"), None)
            .unwrap();
        assert_eq!(out.into_option().unwrap().street, "Elm");
    }

    #[test]
    fn error_inside_embedded_list() {
        let registry = registry();
        let t = ClassTranslator::recycling(address_schema(&registry));
        let mut node = BTreeMap::new();
        node.insert(
            "lines".to_string(),
            Value::List(vec!["a".into(), "b".into(), Value::Int(1)]),
        );
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let err = t
            .load(Some(&Value::Map(node)), &mut ctx, &Path::of("addr"), None)
            .unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "addr.lines[2]");
    }

    #[test]
    fn ignore_flags() {
        let registry = registry();
        let schema = ClassSchema::builder("Address", &registry)
            .field("street", |a: &Address| &a.street, |a: &mut Address| &mut a.street)
            .ignore_save()
            .field("zip", |a: &Address| &a.zip, |a: &mut Address| &mut a.zip)
            .ignore_load()
            .build()
            .unwrap();

        let mut ctx = SaveContext::new(TranslateConfig::default());
        let saved = schema.save_fields(&sample(), &mut ctx, &Path::root()).unwrap();
        assert!(!saved.contains_key("street"));
        assert_eq!(saved.get("zip"), Some(&Value::Int(12345)));

        let mut props = BTreeMap::new();
        props.insert("street".to_string(), Value::from("Elm"));
        props.insert("zip".to_string(), Value::Int(9));
        let mut target = Address::default();
        let mut ctx = LoadContext::new(TranslateConfig::default());
        schema.load_fields(&props, &mut target, &mut ctx, &Path::root()).unwrap();
        assert_eq!(target.street, "Elm");
        assert_eq!(target.zip, 0);
    }

    struct Upper;

    impl Property<Address> for Upper {
        fn save(&self, owner: &Address, _ctx: &mut SaveContext, _path: &Path) -> TranslateResult<Outcome<Value>> {
            Ok(Outcome::Assign(Value::String(owner.street.to_uppercase())))
        }

        fn load(
            &self,
            _node: Option<&Value>,
            _owner: &mut Address,
            _ctx: &mut LoadContext<'_>,
            _path: &Path,
        ) -> TranslateResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn computed_property_is_saved() {
        let registry = registry();
        let schema = ClassSchema::builder("Address", &registry)
            .property("street_upper", Upper)
            .build()
            .unwrap();
        let mut ctx = SaveContext::new(TranslateConfig::default());
        let saved = schema.save_fields(&sample(), &mut ctx, &Path::root()).unwrap();
        assert_eq!(saved.get("street_upper"), Some(&Value::from("MAIN")));
    }

    #[test]
    fn builder_reports_schema_errors() {
        struct Opaque;
        struct Holder {
            o: Opaque,
        }

        let registry = registry();
        let err = ClassSchema::builder("Holder", &registry)
            .field("o", |h: &Holder| &h.o, |h: &mut Holder| &mut h.o)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::NoTranslator { ref field, .. } if field == "o"));

        let err = ClassSchema::builder("Address", &registry)
            .field("zip", |a: &Address| &a.zip, |a: &mut Address| &mut a.zip)
            .field("zip", |a: &Address| &a.zip, |a: &mut Address| &mut a.zip)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                class: "Address".into(),
                field: "zip".into()
            }
        );

        let err = ClassSchema::builder("Address", &registry)
            .field("^d", |a: &Address| &a.zip, |a: &mut Address| &mut a.zip)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReservedName { .. }));

        let err = ClassSchema::<Address>::builder("Address", &registry)
            .ignore_save()
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::OptionWithoutField { .. }));
    }
}
