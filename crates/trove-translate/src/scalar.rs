//! Translators for single-valued field types.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use trove_types::{Key, Path, Value, ValueType};

use crate::context::{LoadContext, SaveContext};
use crate::error::{TranslateError, TranslateResult};
use crate::outcome::Outcome;
use crate::translator::Translator;

/// Encoding of one scalar type.
pub trait ScalarCodec<P>: Send + Sync {
    fn stored_as(&self) -> ValueType;

    fn encode(&self, value: &P) -> Value;

    /// Decode a present, non-null value.
    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<P>;
}

/// Adapts a [`ScalarCodec`] to the [`Translator`] contract.
///
/// Explicit null is rejected; wrap the field in `Option` to allow it. A load
/// that decodes to the value the field already holds reports `Skip`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scalar<C>(pub C);

impl<P, C> Translator<P> for Scalar<C>
where
    P: PartialEq,
    C: ScalarCodec<P>,
{
    fn save(&self, value: &P, _ctx: &mut SaveContext, _path: &Path) -> TranslateResult<Outcome<Value>> {
        Ok(Outcome::Assign(self.0.encode(value)))
    }

    fn load(
        &self,
        node: Option<&Value>,
        _ctx: &mut LoadContext<'_>,
        path: &Path,
        into: Option<&mut P>,
    ) -> TranslateResult<Outcome<P>> {
        let Some(node) = node else {
            return Ok(Outcome::Skip);
        };
        if node.is_null() {
            return Err(TranslateError::mismatch(path, self.0.stored_as(), ValueType::Null));
        }
        let value = self.0.decode(node, path)?;
        if into.is_some_and(|current| *current == value) {
            return Ok(Outcome::Skip);
        }
        Ok(Outcome::Assign(value))
    }
}

fn expect<'v, T>(
    found: Option<T>,
    node: &'v Value,
    path: &Path,
    expected: ValueType,
) -> TranslateResult<T> {
    found.ok_or_else(|| TranslateError::mismatch(path, expected, node.value_type()))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StringCodec;

impl ScalarCodec<String> for StringCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::String
    }

    fn encode(&self, value: &String) -> Value {
        Value::String(value.clone())
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<String> {
        expect(value.as_str(), value, path, ValueType::String).map(str::to_string)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IntCodec;

impl ScalarCodec<i64> for IntCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::Int
    }

    fn encode(&self, value: &i64) -> Value {
        Value::Int(*value)
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<i64> {
        expect(value.as_int(), value, path, ValueType::Int)
    }
}

impl ScalarCodec<i32> for IntCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::Int
    }

    fn encode(&self, value: &i32) -> Value {
        Value::Int(i64::from(*value))
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<i32> {
        let wide = expect(value.as_int(), value, path, ValueType::Int)?;
        i32::try_from(wide).map_err(|_| TranslateError::OutOfRange {
            path: path.clone(),
            value: wide,
            target: "i32",
        })
    }
}

/// Doubles; stored integers are widened on load.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleCodec;

impl ScalarCodec<f64> for DoubleCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::Double
    }

    fn encode(&self, value: &f64) -> Value {
        Value::Double(*value)
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<f64> {
        expect(value.as_double(), value, path, ValueType::Double)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BoolCodec;

impl ScalarCodec<bool> for BoolCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::Bool
    }

    fn encode(&self, value: &bool) -> Value {
        Value::Bool(*value)
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<bool> {
        expect(value.as_bool(), value, path, ValueType::Bool)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BlobCodec;

impl ScalarCodec<Bytes> for BlobCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::Blob
    }

    fn encode(&self, value: &Bytes) -> Value {
        Value::Blob(value.clone())
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<Bytes> {
        expect(value.as_blob(), value, path, ValueType::Blob).cloned()
    }
}

/// Keyed references to other records.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyCodec;

impl ScalarCodec<Key> for KeyCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::Key
    }

    fn encode(&self, value: &Key) -> Value {
        Value::Key(value.clone())
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<Key> {
        expect(value.as_key(), value, path, ValueType::Key).cloned()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampCodec;

impl ScalarCodec<DateTime<Utc>> for TimestampCodec {
    fn stored_as(&self) -> ValueType {
        ValueType::Timestamp
    }

    fn encode(&self, value: &DateTime<Utc>) -> Value {
        Value::Timestamp(*value)
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<DateTime<Utc>> {
        expect(value.as_timestamp(), value, path, ValueType::Timestamp).copied()
    }
}

/// Fieldless enums stored by variant name.
pub struct EnumCodec<P> {
    to_name: fn(&P) -> &'static str,
    from_name: fn(&str) -> Option<P>,
}

impl<P> EnumCodec<P> {
    pub fn new(to_name: fn(&P) -> &'static str, from_name: fn(&str) -> Option<P>) -> Self {
        Self { to_name, from_name }
    }
}

impl<P> ScalarCodec<P> for EnumCodec<P>
where
    P: Send + Sync,
{
    fn stored_as(&self) -> ValueType {
        ValueType::String
    }

    fn encode(&self, value: &P) -> Value {
        Value::String((self.to_name)(value).to_string())
    }

    fn decode(&self, value: &Value, path: &Path) -> TranslateResult<P> {
        let name = expect(value.as_str(), value, path, ValueType::String)?;
        (self.from_name)(name).ok_or_else(|| TranslateError::UnknownVariant {
            path: path.clone(),
            name: name.to_string(),
        })
    }
}

/// Translator for a fieldless enum.
pub type EnumTranslator<P> = Scalar<EnumCodec<P>>;

impl<P> EnumTranslator<P> {
    pub fn enumeration(to_name: fn(&P) -> &'static str, from_name: fn(&str) -> Option<P>) -> Self {
        Scalar(EnumCodec::new(to_name, from_name))
    }
}
