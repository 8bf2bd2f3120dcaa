//! Recycling translators for sequences and sets, stored as lists.
//!
//! Empty collections are never stored: saving one yields `Skip`, and a
//! missing property leaves the destination's collection as it was.

use std::collections::BTreeSet;

use tracing::warn;
use trove_types::{Path, Value, ValueType};

use crate::context::{LoadContext, SaveContext};
use crate::error::{TranslateError, TranslateResult};
use crate::outcome::{Outcome, Recycle};
use crate::translator::{Recycles, Translator};

fn list_items<'v>(node: &'v Value, path: &Path) -> TranslateResult<&'v [Value]> {
    node.as_list()
        .ok_or_else(|| TranslateError::mismatch(path, ValueType::List, node.value_type()))
}

fn save_items<'a, P: 'a, T: Translator<P>>(
    element: &T,
    items: impl Iterator<Item = &'a P>,
    ctx: &mut SaveContext,
    path: &Path,
) -> TranslateResult<Outcome<Value>> {
    ctx.enter(path)?;
    let mut out = Vec::new();
    for (i, item) in items.enumerate() {
        if let Outcome::Assign(value) = element.save(item, ctx, &path.index(i))? {
            out.push(value);
        }
    }
    if out.is_empty() {
        return Ok(Outcome::Skip);
    }
    Ok(Outcome::Assign(Value::List(out)))
}

/// `Vec<P>` stored as a list, reusing existing elements position by position.
#[derive(Clone, Debug)]
pub struct ListTranslator<T> {
    element: T,
}

impl<T> ListTranslator<T> {
    pub fn new(element: T) -> Self {
        Self { element }
    }
}

impl<P, T> Recycles<Vec<P>> for ListTranslator<T>
where
    T: Translator<P>,
{
    fn stored_as(&self) -> ValueType {
        ValueType::List
    }

    fn save(&self, value: &Vec<P>, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>> {
        save_items(&self.element, value.iter(), ctx, path)
    }

    fn load_into(
        &self,
        node: &Value,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut Vec<P>>,
    ) -> TranslateResult<Recycle<Vec<P>>> {
        let items = list_items(node, path)?;
        ctx.enter(path)?;

        let Some(list) = into else {
            let mut fresh = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match self.element.load(Some(item), ctx, &path.index(i), None)? {
                    Outcome::Assign(value) => fresh.push(value),
                    Outcome::Skip => warn!(path = %path.index(i), "list element skipped on load"),
                }
            }
            return Ok(Recycle::Changed(fresh));
        };

        let mut changed = false;
        let mut len = 0;
        for (i, item) in items.iter().enumerate() {
            let slot = list.get_mut(len);
            let had_slot = slot.is_some();
            match self.element.load(Some(item), ctx, &path.index(i), slot)? {
                Outcome::Assign(value) if had_slot => {
                    list[len] = value;
                    len += 1;
                    changed = true;
                }
                Outcome::Assign(value) => {
                    list.push(value);
                    len += 1;
                    changed = true;
                }
                Outcome::Skip if had_slot => len += 1,
                Outcome::Skip => warn!(path = %path.index(i), "list element skipped on load"),
            }
        }
        if list.len() != len {
            list.truncate(len);
            changed = true;
        }

        if changed {
            Ok(Recycle::Changed(std::mem::take(list)))
        } else {
            Ok(Recycle::Unchanged)
        }
    }
}

/// `BTreeSet<P>` stored as a list in set order.
#[derive(Clone, Debug)]
pub struct SetTranslator<T> {
    element: T,
}

impl<T> SetTranslator<T> {
    pub fn new(element: T) -> Self {
        Self { element }
    }
}

impl<P, T> Recycles<BTreeSet<P>> for SetTranslator<T>
where
    P: Ord,
    T: Translator<P>,
{
    fn stored_as(&self) -> ValueType {
        ValueType::List
    }

    fn save(
        &self,
        value: &BTreeSet<P>,
        ctx: &mut SaveContext,
        path: &Path,
    ) -> TranslateResult<Outcome<Value>> {
        save_items(&self.element, value.iter(), ctx, path)
    }

    fn load_into(
        &self,
        node: &Value,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut BTreeSet<P>>,
    ) -> TranslateResult<Recycle<BTreeSet<P>>> {
        let items = list_items(node, path)?;
        ctx.enter(path)?;

        // Set members cannot be mutated in place, so elements are always
        // loaded fresh and the whole set compared afterwards.
        let mut loaded = BTreeSet::new();
        for (i, item) in items.iter().enumerate() {
            if let Outcome::Assign(value) = self.element.load(Some(item), ctx, &path.index(i), None)? {
                loaded.insert(value);
            }
        }

        match into {
            Some(existing) if *existing == loaded => Ok(Recycle::Unchanged),
            _ => Ok(Recycle::Changed(loaded)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateConfig;
    use crate::scalar::{IntCodec, Scalar, StringCodec};
    use crate::translator::Recycling;
    use proptest::prelude::*;

    type Strings = Recycling<ListTranslator<Scalar<StringCodec>>>;

    fn strings() -> Strings {
        Recycling(ListTranslator::new(Scalar(StringCodec)))
    }

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| Value::from(*s)).collect())
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn save<P, T: Translator<P>>(t: &T, value: &P) -> Outcome<Value> {
        let mut ctx = SaveContext::new(TranslateConfig::default());
        t.save(value, &mut ctx, &Path::of("tags")).unwrap()
    }

    #[test]
    fn empty_list_saves_as_skip() {
        assert!(save(&strings(), &Vec::<String>::new()).is_skip());
        assert_eq!(save(&strings(), &owned(&["a"])), Outcome::Assign(list(&["a"])));
    }

    #[test]
    fn missing_leaves_fresh_empty_list() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target: Vec<String> = Vec::new();
        let out = strings()
            .load(None, &mut ctx, &Path::of("tags"), Some(&mut target))
            .unwrap();
        assert!(out.is_skip());
        assert!(target.is_empty());
    }

    #[test]
    fn explicit_null_on_bare_list_is_mismatch() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let err = strings()
            .load(Some(&Value::Null), &mut ctx, &Path::of("tags"), None)
            .unwrap_err();
        assert_eq!(
            err,
            TranslateError::mismatch(&Path::of("tags"), ValueType::List, ValueType::Null)
        );
    }

    #[test]
    fn unchanged_reload_skips_and_keeps_buffer() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target = owned(&["a", "b"]);
        let before = target.as_ptr();

        let out = strings()
            .load(Some(&list(&["a", "b"])), &mut ctx, &Path::of("tags"), Some(&mut target))
            .unwrap();
        assert!(out.is_skip());
        assert_eq!(target.as_ptr(), before);
        assert_eq!(ctx.stats().unchanged, 1);
    }

    #[test]
    fn changed_reload_assigns_same_buffer() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target = Vec::with_capacity(4);
        target.extend(owned(&["a", "b", "c"]));
        let before = target.as_ptr();

        let out = strings()
            .load(Some(&list(&["a", "z"])), &mut ctx, &Path::of("tags"), Some(&mut target))
            .unwrap();
        let Outcome::Assign(loaded) = out else {
            panic!("changed content must be assigned");
        };
        assert_eq!(loaded, owned(&["a", "z"]));
        assert_eq!(loaded.as_ptr(), before);
    }

    #[test]
    fn growing_list_appends() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target = owned(&["a"]);
        let out = strings()
            .load(Some(&list(&["a", "b"])), &mut ctx, &Path::of("tags"), Some(&mut target))
            .unwrap();
        assert_eq!(out, Outcome::Assign(owned(&["a", "b"])));
    }

    #[test]
    fn element_error_reports_index() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let node = Value::List(vec!["a".into(), "b".into(), Value::Int(3)]);
        let err = strings()
            .load(Some(&node), &mut ctx, &Path::of("addr"), None)
            .unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("addr[2]"));
    }

    #[test]
    fn nested_lists_report_full_path() {
        let nested = Recycling(ListTranslator::new(strings()));
        let node = Value::List(vec![list(&["ok"]), Value::List(vec![Value::Bool(true)])]);
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let err = nested
            .load(Some(&node), &mut ctx, &Path::of("grid"), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "grid[1][0]: expected string, found bool");
    }

    #[test]
    fn scalar_where_list_expected() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let err = strings()
            .load(Some(&Value::from("solo")), &mut ctx, &Path::of("tags"), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "tags: expected list, found string");
    }

    #[test]
    fn set_roundtrip_and_recycle() {
        let sets = Recycling(SetTranslator::new(Scalar(IntCodec)));
        let value: BTreeSet<i64> = [3, 1, 2].into_iter().collect();
        let Outcome::Assign(stored) = save(&sets, &value) else {
            panic!("non-empty set must be stored");
        };
        assert_eq!(stored, Value::List(vec![1i64.into(), 2i64.into(), 3i64.into()]));

        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut target = value.clone();
        let out = sets
            .load(Some(&stored), &mut ctx, &Path::of("ids"), Some(&mut target))
            .unwrap();
        assert!(out.is_skip());

        let mut target: BTreeSet<i64> = [9].into_iter().collect();
        let out = sets
            .load(Some(&stored), &mut ctx, &Path::of("ids"), Some(&mut target))
            .unwrap();
        assert_eq!(out, Outcome::Assign(value));
        assert!(save(&sets, &BTreeSet::<i64>::new()).is_skip());
    }

    proptest! {
        #[test]
        fn load_after_save_restores_non_empty_lists(items in proptest::collection::vec(".*", 1..8)) {
            let stored = save(&strings(), &items).into_option().unwrap();
            let mut ctx = LoadContext::new(TranslateConfig::default());
            let loaded = strings()
                .load(Some(&stored), &mut ctx, &Path::of("tags"), None)
                .unwrap();
            prop_assert_eq!(loaded, Outcome::Assign(items));
        }
    }
}
