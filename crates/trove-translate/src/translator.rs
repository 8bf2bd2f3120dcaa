//! The translator contract and the recycling adapter.

use std::sync::Arc;

use tracing::trace;
use trove_types::{Path, Value, ValueType};

use crate::context::{LoadContext, SaveContext};
use crate::error::{TranslateError, TranslateResult};
use crate::outcome::{Outcome, Recycle};

/// Converts one Rust type to and from [`Value`].
///
/// Translators are stateless after construction and shared between
/// concurrent operations; all per-call state lives in the contexts.
pub trait Translator<P>: Send + Sync {
    /// Convert `value` to a stored value, or `Skip` to leave the property out.
    ///
    /// Must not mutate `value`.
    fn save(&self, value: &P, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>>;

    /// Convert a stored value back.
    ///
    /// `node` is `None` when the property is missing from its parent, which
    /// always yields `Skip`. `into` is the value the destination currently
    /// holds, if any; translators may populate it in place and report `Skip`
    /// when it already matches the stored content.
    fn load(
        &self,
        node: Option<&Value>,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Outcome<P>>;
}

impl<P, T> Translator<P> for Arc<T>
where
    T: Translator<P> + ?Sized,
{
    fn save(&self, value: &P, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>> {
        (**self).save(value, ctx, path)
    }

    fn load(
        &self,
        node: Option<&Value>,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Outcome<P>> {
        (**self).load(node, ctx, path, into)
    }
}

/// Container-like translators that reuse the destination's existing value.
///
/// Implementors only see present, non-null nodes; [`Recycling`] handles the
/// missing and null cases and turns [`Recycle::Unchanged`] into `Skip`.
pub trait Recycles<P>: Send + Sync {
    /// The value type this container is stored as.
    fn stored_as(&self) -> ValueType;

    fn save(&self, value: &P, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>>;

    /// Populate `into` when present, otherwise build a new value.
    fn load_into(
        &self,
        node: &Value,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Recycle<P>>;
}

/// Adapts a [`Recycles`] implementation to the [`Translator`] contract.
#[derive(Clone, Debug)]
pub struct Recycling<R>(pub R);

impl<P, R> Translator<P> for Recycling<R>
where
    R: Recycles<P>,
{
    fn save(&self, value: &P, ctx: &mut SaveContext, path: &Path) -> TranslateResult<Outcome<Value>> {
        self.0.save(value, ctx, path)
    }

    fn load(
        &self,
        node: Option<&Value>,
        ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Outcome<P>> {
        // A missing container mirrors how empty containers are saved.
        let Some(node) = node else {
            return Ok(Outcome::Skip);
        };
        if node.is_null() {
            return Err(TranslateError::mismatch(path, self.0.stored_as(), ValueType::Null));
        }

        if into.is_some() {
            ctx.note_recycled();
        } else {
            ctx.note_allocated();
        }

        match self.0.load_into(node, ctx, path, into)? {
            Recycle::Unchanged => {
                trace!(%path, "recycled value unchanged");
                ctx.note_unchanged();
                Ok(Outcome::Skip)
            }
            Recycle::Changed(value) => Ok(Outcome::Assign(value)),
        }
    }
}
