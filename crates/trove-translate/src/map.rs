//! String-keyed maps stored as embedded `Value::Map`s.

use std::collections::BTreeMap;

use trove_types::{Path, Value, ValueType};

use crate::context::{LoadContext, SaveContext};
use crate::error::{TranslateError, TranslateResult};
use crate::outcome::{Outcome, Recycle};
use crate::translator::{Recycles, Translator};

/// `BTreeMap<String, P>` stored as an embedded map.
///
/// Entries are recycled by key: an entry already present in the destination
/// is handed to the value translator, entries no longer stored are removed.
/// An empty map is not stored.
#[derive(Clone, Debug)]
pub struct MapTranslator<T> {
    value: T,
}

impl<T> MapTranslator<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<P, T> Recycles<BTreeMap<String, P>> for MapTranslator<T>
where
    T: Translator<P>,
{
    fn stored_as(&self) -> ValueType {
        ValueType::Map
    }

    fn save(
        &self,
        map: &BTreeMap<String, P>,
        ctx: &mut SaveContext,
        path: &Path,
    ) -> TranslateResult<Outcome<Value>> {
        ctx.enter(path)?;
        let mut out = BTreeMap::new();
        for (name, item) in map {
            if let Outcome::Assign(value) = self.value.save(item, ctx, &path.field(name.as_str()))? {
                out.insert(name.clone(), value);
            }
        }
        if out.is_empty() {
            return Ok(Outcome::Skip);
        }
        Ok(Outcome::Assign(Value::Map(out)))
    }

    fn load_into(
        &self,
        node: &Value,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut BTreeMap<String, P>>,
    ) -> TranslateResult<Recycle<BTreeMap<String, P>>> {
        let entries = node
            .as_map()
            .ok_or_else(|| TranslateError::mismatch(path, ValueType::Map, node.value_type()))?;
        ctx.enter(path)?;

        let Some(map) = into else {
            let mut fresh = BTreeMap::new();
            for (name, item) in entries {
                let child = path.field(name.as_str());
                if let Outcome::Assign(value) = self.value.load(Some(item), ctx, &child, None)? {
                    fresh.insert(name.clone(), value);
                }
            }
            return Ok(Recycle::Changed(fresh));
        };

        let mut changed = false;
        for (name, item) in entries {
            let child = path.field(name.as_str());
            if let Outcome::Assign(value) = self.value.load(Some(item), ctx, &child, map.get_mut(name))? {
                map.insert(name.clone(), value);
                changed = true;
            }
        }
        let before = map.len();
        map.retain(|name, _| entries.contains_key(name));
        changed |= map.len() != before;

        if changed {
            Ok(Recycle::Changed(std::mem::take(map)))
        } else {
            Ok(Recycle::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateConfig;
    use crate::scalar::{IntCodec, Scalar};
    use crate::translator::Recycling;

    fn scores() -> impl Translator<BTreeMap<String, i64>> {
        Recycling(MapTranslator::new(Scalar(IntCodec)))
    }

    fn stored(entries: &[(&str, i64)]) -> Value {
        Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), Value::Int(*v)))
                .collect(),
        )
    }

    fn owned(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn save_omits_empty_map() {
        let mut ctx = SaveContext::new(TranslateConfig::default());
        let out = scores()
            .save(&BTreeMap::new(), &mut ctx, &Path::of("scores"))
            .unwrap();
        assert!(out.is_skip());

        let out = scores()
            .save(&owned(&[("a", 1)]), &mut ctx, &Path::of("scores"))
            .unwrap();
        assert_eq!(out, Outcome::Assign(stored(&[("a", 1)])));
    }

    #[test]
    fn reload_unchanged_is_skip() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target = owned(&[("a", 1), ("b", 2)]);
        let out = scores()
            .load(
                Some(&stored(&[("a", 1), ("b", 2)])),
                &mut ctx,
                &Path::of("scores"),
                Some(&mut target),
            )
            .unwrap();
        assert!(out.is_skip());
        assert_eq!(target, owned(&[("a", 1), ("b", 2)]));
    }

    #[test]
    fn reload_removes_and_updates_entries() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target = owned(&[("a", 1), ("b", 2)]);
        let out = scores()
            .load(
                Some(&stored(&[("a", 5)])),
                &mut ctx,
                &Path::of("scores"),
                Some(&mut target),
            )
            .unwrap();
        assert_eq!(out, Outcome::Assign(owned(&[("a", 5)])));
    }

    #[test]
    fn removal_alone_counts_as_change() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target = owned(&[("a", 1), ("b", 2)]);
        let out = scores()
            .load(
                Some(&stored(&[("a", 1)])),
                &mut ctx,
                &Path::of("scores"),
                Some(&mut target),
            )
            .unwrap();
        assert_eq!(out, Outcome::Assign(owned(&[("a", 1)])));
    }

    #[test]
    fn entry_error_path_uses_key() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut node = BTreeMap::new();
        node.insert("bad".to_string(), Value::from("x"));
        let err = scores()
            .load(Some(&Value::Map(node)), &mut ctx, &Path::of("scores"), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "scores.bad: expected int, found string");
    }
}
