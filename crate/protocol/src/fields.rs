use std::fmt::{self, Display};

use crate::canonical;

/// A single value carried by a [`FieldMapping`].
///
/// The gateway only transmits strings; integers are kept apart so callers can pass
/// amounts as numbers, they are rendered with their decimal representation both on the
/// wire and in the signing string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    /// A decoded sub-document, e.g. the decrypted `req_info` of a refund notification.
    Nested(FieldMapping),
}

impl FieldValue {
    /// The text value, if this is a `Text`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_nested(&self) -> Option<&FieldMapping> {
        match self {
            Self::Nested(m) => Some(m),
            _ => None,
        }
    }

    /// Empty strings are dropped from the signing string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Nested(m) => f.write_str(&canonical::encode(m)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<FieldMapping> for FieldValue {
    fn from(m: FieldMapping) -> Self {
        Self::Nested(m)
    }
}

/// Insertion-ordered mapping with unique keys.
///
/// Re-inserting an existing key replaces the value in place and keeps the key position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMapping {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<FieldValue>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder flavour of [`Self::insert`].
    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The value of `key` when it is a text field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    /// The value of `key` rendered as it would be on the wire.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(ToString::to_string)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMapping
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        mapping.extend(iter);
        mapping
    }
}

impl<K, V> Extend<(K, V)> for FieldMapping
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for FieldMapping {
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;
    type Item = (String, FieldValue);

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Merge caller parameters over defaults.
///
/// The result starts with the defaults in their order; a caller key already present
/// replaces the default value in place, new caller keys are appended. An empty string
/// supplied by the caller still overrides the default: it is sent on the wire but
/// dropped from the signing string. To get rid of a default entirely the caller removes
/// the key from the merged mapping.
#[must_use]
pub fn merge(defaults: FieldMapping, params: FieldMapping) -> FieldMapping {
    let mut merged = defaults;
    merged.extend(params);
    merged
}

/// Build a [`FieldMapping`] from `key => value` pairs.
///
/// ```ignore
/// let params = fields! { "out_trade_no" => "T1", "total_fee" => 101 };
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::FieldMapping::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut mapping = $crate::FieldMapping::new();
        $( mapping.insert($key, $value); )+
        mapping
    }};
}
