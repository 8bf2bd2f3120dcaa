use trove_types::{Path, Value};

use crate::config::NullPolicy;
use crate::context::{LoadContext, SaveContext};
use crate::error::TranslateResult;
use crate::outcome::Outcome;
use crate::translator::Translator;

/// Translator for `Option<P>`, delegating present values to `T`.
///
/// A stored null loads as `None` without consulting `T`, so recycling never
/// happens for it. `None` saves as an explicit null or is omitted, depending
/// on the [`NullPolicy`].
#[derive(Clone, Debug)]
pub struct Nullable<T> {
    inner: T,
    policy: NullPolicy,
}

impl<T> Nullable<T> {
    pub fn new(inner: T, policy: NullPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> NullPolicy {
        self.policy
    }
}

impl<P, T> Translator<Option<P>> for Nullable<T>
where
    T: Translator<P>,
{
    fn save(
        &self,
        value: &Option<P>,
        ctx: &mut SaveContext,
        path: &Path,
    ) -> TranslateResult<Outcome<Value>> {
        match value {
            Some(value) => self.inner.save(value, ctx, path),
            None => Ok(match self.policy {
                NullPolicy::Store => Outcome::Assign(Value::Null),
                NullPolicy::Omit => Outcome::Skip,
            }),
        }
    }

    fn load(
        &self,
        node: Option<&Value>,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut Option<P>>,
    ) -> TranslateResult<Outcome<Option<P>>> {
        match node {
            None => Ok(Outcome::Skip),
            Some(Value::Null) => Ok(Outcome::Assign(None)),
            Some(node) => {
                let recycled = into.and_then(Option::as_mut);
                Ok(self.inner.load(Some(node), ctx, path, recycled)?.map(Some))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ListTranslator;
    use crate::config::TranslateConfig;
    use crate::scalar::{Scalar, StringCodec};
    use crate::translator::Recycling;

    fn tags() -> Nullable<Recycling<ListTranslator<Scalar<StringCodec>>>> {
        Nullable::new(
            Recycling(ListTranslator::new(Scalar(StringCodec))),
            NullPolicy::Store,
        )
    }

    #[test]
    fn null_loads_as_none_even_over_existing() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut current = Some(vec!["a".to_string()]);
        let out = tags()
            .load(Some(&Value::Null), &mut ctx, &Path::of("tags"), Some(&mut current))
            .unwrap();
        assert_eq!(out, Outcome::Assign(None));
        // Null never consults the recycled value.
        assert_eq!(ctx.stats().recycled, 0);
    }

    #[test]
    fn missing_is_skip() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut current: Option<Vec<String>> = None;
        let out = tags()
            .load(None, &mut ctx, &Path::of("tags"), Some(&mut current))
            .unwrap();
        assert!(out.is_skip());
    }

    #[test]
    fn present_value_fills_none_field() {
        let mut ctx = LoadContext::new(TranslateConfig::default());
        let mut current: Option<Vec<String>> = None;
        let node = Value::List(vec!["x".into()]);
        let out = tags()
            .load(Some(&node), &mut ctx, &Path::of("tags"), Some(&mut current))
            .unwrap();
        assert_eq!(out, Outcome::Assign(Some(vec!["x".to_string()])));
        assert_eq!(ctx.stats().allocated, 1);
    }

    #[test]
    fn none_saves_per_policy() {
        let mut ctx = SaveContext::new(TranslateConfig::default());
        let stored = Nullable::new(Scalar(StringCodec), NullPolicy::Store);
        let omitted = Nullable::new(Scalar(StringCodec), NullPolicy::Omit);
        let none: Option<String> = None;

        assert_eq!(
            stored.save(&none, &mut ctx, &Path::of("n")).unwrap(),
            Outcome::Assign(Value::Null)
        );
        assert!(omitted.save(&none, &mut ctx, &Path::of("n")).unwrap().is_skip());
        assert_eq!(
            omitted
                .save(&Some("v".to_string()), &mut ctx, &Path::of("n"))
                .unwrap(),
            Outcome::Assign(Value::from("v"))
        );
    }
}
