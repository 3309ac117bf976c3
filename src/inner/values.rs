use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, SessionError};

/// Key of a [`Values`] entry: either an integer or a string.
///
/// `Key::from(66)` and `Key::from("66")` are different keys. Integer keys are
/// `i64`; wider types convert through `Key::try_from`, which rejects values
/// outside the `i64` range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

macro_rules! int_key {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(value: $t) -> Self {
                    Key::Int(i64::from(value))
                }
            }
        )*
    };
}

int_key!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_int_key {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for Key {
                type Error = std::num::TryFromIntError;

                fn try_from(value: $t) -> std::result::Result<Self, Self::Error> {
                    i64::try_from(value).map(Key::Int)
                }
            }
        )*
    };
}

wide_int_key!(u64, usize, i128, u128);

/// The dynamic session value bag.
///
/// Entries are kept ordered by key and serialized as an array of
/// `[key, value]` pairs, so integer keys survive the trip through JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    data: BTreeMap<Key, Value>,
}

impl Values {
    pub fn new() -> Self {
        Values::default()
    }
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.data.get(&key.into())
    }
    /// Deserializes the entry under `key`, `None` if it is absent or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: impl Into<Key>) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
    }
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }
    /// Serializes `value` and stores it under `key`.
    pub fn set<T: Serialize>(&mut self, key: impl Into<Key>, value: T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(SessionError::Encoding)?;
        self.data.insert(key.into(), value);
        Ok(())
    }
    pub fn remove(&mut self, key: impl Into<Key>) -> Option<Value> {
        self.data.remove(&key.into())
    }
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.data.contains_key(&key.into())
    }
    pub fn clear(&mut self) {
        self.data.clear();
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn iter(&self) -> btree_map::Iter<'_, Key, Value> {
        self.data.iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a Key, &'a Value);
    type IntoIter = btree_map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Values {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.iter())
    }
}

impl<'de> Deserialize<'de> for Values {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pairs = Vec::<(Key, Value)>::deserialize(deserializer)?;
        Ok(Values {
            data: pairs.into_iter().collect(),
        })
    }
}
