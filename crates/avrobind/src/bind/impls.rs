//! Destination impls for standard types.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::bind::{Bind, Destination, MapSink, Scalar};
use crate::model::{Timestamp, Value};

// =============================================================================
// SCALARS
// =============================================================================

macro_rules! scalar_bind {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn destination(&mut self) -> Destination<'_> {
                    Destination::Scalar(self)
                }
            }
        )*
    };
}

scalar_bind!(bool, i32, i64, f32, f64, String, Vec<u8>, Timestamp, ());

impl Scalar for bool {
    fn kind(&self) -> &'static str {
        "boolean"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Boolean(v) => *self = v,
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for i32 {
    fn kind(&self) -> &'static str {
        "int"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Int(v) => *self = v,
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for i64 {
    fn kind(&self) -> &'static str {
        "long"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Int(v) => *self = v as i64,
            Value::Long(v) => *self = v,
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for f32 {
    fn kind(&self) -> &'static str {
        "float"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Int(v) => *self = v as f32,
            Value::Long(v) => *self = v as f32,
            Value::Float(v) => *self = v,
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for f64 {
    fn kind(&self) -> &'static str {
        "double"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Int(v) => *self = v as f64,
            Value::Long(v) => *self = v as f64,
            Value::Float(v) => *self = v as f64,
            Value::Double(v) => *self = v,
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for String {
    fn kind(&self) -> &'static str {
        "string"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::String(v) => *self = v,
            Value::Bytes(v) => match String::from_utf8(v) {
                Ok(s) => *self = s,
                Err(e) => return Err(Value::Bytes(e.into_bytes())),
            },
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for Vec<u8> {
    fn kind(&self) -> &'static str {
        "bytes"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Bytes(v) => *self = v,
            Value::String(v) => *self = v.into_bytes(),
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for Timestamp {
    fn kind(&self) -> &'static str {
        "timestamp"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Timestamp(v) => *self = v,
            other => return Err(other),
        }
        Ok(())
    }
}

impl Scalar for () {
    fn kind(&self) -> &'static str {
        "null"
    }

    fn assign(&mut self, value: Value) -> Result<(), Value> {
        match value {
            Value::Null => Ok(()),
            other => Err(other),
        }
    }
}

// =============================================================================
// WRAPPERS
// =============================================================================

impl<T: Bind + Default> Bind for Option<T> {
    fn destination(&mut self) -> Destination<'_> {
        self.get_or_insert_with(T::default).destination()
    }
}

impl<T: Bind + ?Sized> Bind for Box<T> {
    fn destination(&mut self) -> Destination<'_> {
        self.as_mut().destination()
    }
}

// =============================================================================
// MAPS
// =============================================================================

/// A map key type.
///
/// Only string-like keys can hold record field names or map keys; other key
/// types are accepted as destinations but rejected at bind time with
/// [`DecodeError::IncompatibleMapKey`](crate::DecodeError::IncompatibleMapKey).
pub trait MapKey: Sized {
    /// Name of the key type, for diagnostics.
    const KIND: &'static str;

    /// Whether [`MapKey::from_key`] can succeed.
    const STRING_LIKE: bool;

    /// Builds a key from decoded text.
    fn from_key(key: String) -> Option<Self>;
}

impl MapKey for String {
    const KIND: &'static str = "string";
    const STRING_LIKE: bool = true;

    fn from_key(key: String) -> Option<Self> {
        Some(key)
    }
}

impl MapKey for Box<str> {
    const KIND: &'static str = "string";
    const STRING_LIKE: bool = true;

    fn from_key(key: String) -> Option<Self> {
        Some(key.into_boxed_str())
    }
}

impl MapKey for Arc<str> {
    const KIND: &'static str = "string";
    const STRING_LIKE: bool = true;

    fn from_key(key: String) -> Option<Self> {
        Some(Arc::from(key))
    }
}

impl MapKey for Rc<str> {
    const KIND: &'static str = "string";
    const STRING_LIKE: bool = true;

    fn from_key(key: String) -> Option<Self> {
        Some(Rc::from(key))
    }
}

macro_rules! non_string_key {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl MapKey for $ty {
                const KIND: &'static str = $kind;
                const STRING_LIKE: bool = false;

                fn from_key(_key: String) -> Option<Self> {
                    None
                }
            }
        )*
    };
}

non_string_key!(
    i32 => "int",
    i64 => "long",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    bool => "boolean",
);

impl<K, V, S> MapSink for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Bind + Default,
    S: BuildHasher,
{
    fn key_kind(&self) -> &'static str {
        K::KIND
    }

    fn accepts_string_keys(&self) -> bool {
        K::STRING_LIKE
    }

    fn entry(&mut self, key: String) -> Option<&mut dyn Bind> {
        let key = K::from_key(key)?;
        let value: &mut dyn Bind = HashMap::entry(self, key).or_default();
        Some(value)
    }
}

impl<K, V, S> Bind for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Bind + Default,
    S: BuildHasher,
{
    fn destination(&mut self) -> Destination<'_> {
        Destination::Associative(self)
    }
}

impl<K, V> MapSink for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Bind + Default,
{
    fn key_kind(&self) -> &'static str {
        K::KIND
    }

    fn accepts_string_keys(&self) -> bool {
        K::STRING_LIKE
    }

    fn entry(&mut self, key: String) -> Option<&mut dyn Bind> {
        let key = K::from_key(key)?;
        let value: &mut dyn Bind = BTreeMap::entry(self, key).or_default();
        Some(value)
    }
}

impl<K, V> Bind for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Bind + Default,
{
    fn destination(&mut self) -> Destination<'_> {
        Destination::Associative(self)
    }
}

impl<K, V, S> MapSink for IndexMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Bind + Default,
    S: BuildHasher,
{
    fn key_kind(&self) -> &'static str {
        K::KIND
    }

    fn accepts_string_keys(&self) -> bool {
        K::STRING_LIKE
    }

    fn entry(&mut self, key: String) -> Option<&mut dyn Bind> {
        let key = K::from_key(key)?;
        let value: &mut dyn Bind = IndexMap::entry(self, key).or_default();
        Some(value)
    }
}

impl<K, V, S> Bind for IndexMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Bind + Default,
    S: BuildHasher,
{
    fn destination(&mut self) -> Destination<'_> {
        Destination::Associative(self)
    }
}
