//! Enums whose variants carry embedded structs.
//!
//! Each variant is stored as the map its own translator produces, plus a
//! [`DISCRIMINATOR`] property naming the variant.

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;

use trove_types::{Path, Value, ValueType};

use crate::context::{LoadContext, SaveContext};
use crate::error::{SchemaError, SchemaResult, TranslateError, TranslateResult};
use crate::outcome::Outcome;
use crate::translator::Translator;

/// Property holding the variant name of a polymorphic value.
pub const DISCRIMINATOR: &str = "^d";

trait Arm<P>: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when `value` is not this variant.
    fn save(&self, value: &P, ctx: &mut SaveContext, path: &Path) -> Option<TranslateResult<Outcome<Value>>>;

    fn load(
        &self,
        node: &Value,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Outcome<P>>;
}

struct VariantArm<P, V, T> {
    name: String,
    wrap: fn(V) -> P,
    unwrap: fn(&P) -> Option<&V>,
    unwrap_mut: fn(&mut P) -> Option<&mut V>,
    translator: T,
}

impl<P, V, T> Arm<P> for VariantArm<P, V, T>
where
    T: Translator<V>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn save(&self, value: &P, ctx: &mut SaveContext, path: &Path) -> Option<TranslateResult<Outcome<Value>>> {
        let inner = (self.unwrap)(value)?;
        Some(self.translator.save(inner, ctx, path))
    }

    fn load(
        &self,
        node: &Value,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Outcome<P>> {
        // Only an existing value of the same variant can be recycled.
        let recycled = into.and_then(|p| (self.unwrap_mut)(p));
        Ok(self.translator.load(Some(node), ctx, path, recycled)?.map(self.wrap))
    }
}

/// Translator for an enum of embedded structs, keyed by variant name.
pub struct Polymorphic<P> {
    arms: Vec<Box<dyn Arm<P>>>,
    default: Option<usize>,
}

impl<P: 'static> Polymorphic<P> {
    pub fn builder() -> PolymorphicBuilder<P> {
        PolymorphicBuilder {
            arms: Vec::new(),
            default: None,
            errors: Vec::new(),
        }
    }
}

impl<P> Polymorphic<P> {
    /// Registered variant names in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.arms.iter().map(|arm| arm.name())
    }

    fn arm_for(&self, map: &BTreeMap<String, Value>, path: &Path) -> TranslateResult<&dyn Arm<P>> {
        match map.get(DISCRIMINATOR) {
            Some(Value::String(name)) => self
                .arms
                .iter()
                .find(|arm| arm.name() == name)
                .map(|arm| arm.as_ref())
                .ok_or_else(|| TranslateError::UnknownVariant {
                    path: path.clone(),
                    name: name.clone(),
                }),
            Some(other) => Err(TranslateError::mismatch(
                &path.field(DISCRIMINATOR),
                ValueType::String,
                other.value_type(),
            )),
            None => self
                .default
                .map(|i| self.arms[i].as_ref())
                .ok_or_else(|| TranslateError::MissingDiscriminator { path: path.clone() }),
        }
    }
}

impl<P> fmt::Debug for Polymorphic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polymorphic")
            .field("variants", &self.variants().collect::<Vec<_>>())
            .field("default", &self.default.map(|i| self.arms[i].name()))
            .finish()
    }
}

impl<P> Translator<P> for Polymorphic<P> {
    fn save(&self, value: &P, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>> {
        for arm in &self.arms {
            let Some(saved) = arm.save(value, ctx, path) else {
                continue;
            };
            return match saved? {
                Outcome::Assign(Value::Map(mut map)) => {
                    map.insert(DISCRIMINATOR.to_string(), Value::String(arm.name().to_string()));
                    Ok(Outcome::Assign(Value::Map(map)))
                }
                Outcome::Assign(other) => Err(TranslateError::mismatch(path, ValueType::Map, other.value_type())),
                Outcome::Skip => Ok(Outcome::Skip),
            };
        }
        Err(TranslateError::UnmatchedVariant { path: path.clone() })
    }

    fn load(
        &self,
        node: Option<&Value>,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Outcome<P>> {
        let Some(node) = node else {
            return Ok(Outcome::Skip);
        };
        let map = node
            .as_map()
            .ok_or_else(|| TranslateError::mismatch(path, ValueType::Map, node.value_type()))?;
        self.arm_for(map, path)?.load(node, ctx, path, into)
    }
}

/// Builder for [`Polymorphic`].
pub struct PolymorphicBuilder<P> {
    arms: Vec<Box<dyn Arm<P>>>,
    default: Option<usize>,
    errors: Vec<SchemaError>,
}

impl<P: 'static> PolymorphicBuilder<P> {
    /// Add a variant stored under `name`.
    pub fn variant<V, T>(
        mut self,
        name: &str,
        wrap: fn(V) -> P,
        unwrap: fn(&P) -> Option<&V>,
        unwrap_mut: fn(&mut P) -> Option<&mut V>,
        translator: T,
    ) -> Self
    where
        V: 'static,
        T: Translator<V> + 'static,
    {
        if self.arms.iter().any(|arm| arm.name() == name) {
            self.errors.push(SchemaError::DuplicateVariant {
                name: name.to_string(),
            });
            return self;
        }
        self.arms.push(Box::new(VariantArm {
            name: name.to_string(),
            wrap,
            unwrap,
            unwrap_mut,
            translator,
        }));
        self
    }

    /// Load maps without a discriminator as the last declared variant.
    pub fn default_variant(mut self) -> Self {
        match self.arms.len() {
            0 => self.errors.push(SchemaError::NoVariants {
                type_name: type_name::<P>(),
            }),
            n => self.default = Some(n - 1),
        }
        self
    }

    pub fn build(self) -> SchemaResult<Polymorphic<P>> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        if self.arms.is_empty() {
            return Err(SchemaError::NoVariants {
                type_name: type_name::<P>(),
            });
        }
        Ok(Polymorphic {
            arms: self.arms,
            default: self.default,
        })
    }
}
