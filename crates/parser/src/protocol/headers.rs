//! Case-insensitive, multi-valued header store.
//!
//! Keys are unique by their lowercased form. Writing a key that is already
//! present never drops the earlier value: a single value becomes a list of two,
//! a list grows by one. The key reported by [`Headers::keys`] is the casing used
//! by the most recent write.
//!
//! ```
//! use micro_http_parser::protocol::Headers;
//!
//! let mut headers = Headers::new();
//! headers.set("WARNING", "w2");
//! headers.set("Warning", "w1");
//!
//! assert_eq!(headers.keys().collect::<Vec<_>>(), vec!["Warning"]);
//! assert_eq!(headers.get("warning").unwrap(), &["w2", "w1"][..]);
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::ensure;
use crate::protocol::HeadersError;

/// A value held by [`Headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// The key is present but was explicitly given no value.
    Absent,
    /// The key was written once.
    Single(String),
    /// The key was written more than once, values are kept in write order.
    Multiple(Vec<String>),
}

impl HeaderValue {
    /// Returns the value if it was written exactly once.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            HeaderValue::Single(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, HeaderValue::Absent)
    }

    /// Number of values written, zero for [`HeaderValue::Absent`].
    pub fn len(&self) -> usize {
        match self {
            HeaderValue::Absent => 0,
            HeaderValue::Single(_) => 1,
            HeaderValue::Multiple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the values in write order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderValue::Absent => &[],
            HeaderValue::Single(value) => std::slice::from_ref(value),
            HeaderValue::Multiple(values) => values,
        };
        values.iter().map(String::as_str)
    }

    fn push(self, value: String) -> Self {
        match self {
            HeaderValue::Absent => HeaderValue::Single(value),
            HeaderValue::Single(old) => HeaderValue::Multiple(vec![old, value]),
            HeaderValue::Multiple(mut values) => {
                values.push(value);
                HeaderValue::Multiple(values)
            }
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_owned())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for HeaderValue {
    fn from(values: Vec<S>) -> Self {
        HeaderValue::Multiple(values.into_iter().map(Into::into).collect())
    }
}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        self.as_single() == Some(other)
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_single() == Some(*other)
    }
}

impl PartialEq<[&str]> for HeaderValue {
    fn eq(&self, other: &[&str]) -> bool {
        match self {
            HeaderValue::Multiple(values) => values.iter().map(String::as_str).eq(other.iter().copied()),
            _ => false,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: HeaderValue,
}

/// Ordered, case-insensitive header store.
///
/// Iteration order is the order in which each logical key was first written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds headers from a flat `[key, value, key, value, ...]` sequence,
    /// merging repeated keys the way [`Headers::set`] does.
    ///
    /// # Errors
    ///
    /// Returns [`HeadersError::OddArguments`] if the sequence has an odd length.
    pub fn from_flat<I, T>(items: I) -> Result<Self, HeadersError>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let items: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
        ensure!(items.len() % 2 == 0, HeadersError::OddArguments { len: items.len() });

        let mut headers = Headers::new();
        let mut iter = items.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            headers.set(key, value);
        }
        Ok(headers)
    }

    /// Stores `value` under `key`, keeping every value written before under
    /// the same case-insensitive key. The display key becomes `key`.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: AsRef<str>,
        V: ToString,
    {
        let key = key.as_ref();
        let value = value.to_string();
        let lower = key.to_ascii_lowercase();

        match self.index.get(&lower) {
            Some(&idx) => {
                let entry = &mut self.entries[idx];
                let old = std::mem::replace(&mut entry.value, HeaderValue::Absent);
                entry.value = old.push(value);
                key.clone_into(&mut entry.key);
            }
            None => self.insert(lower, key.to_owned(), HeaderValue::Single(value)),
        }
    }

    /// Returns the single value, or the ordered list of values, for `key`.
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&HeaderValue> {
        let lower = key.as_ref().to_ascii_lowercase();
        self.index.get(&lower).map(|&idx| &self.entries[idx].value)
    }

    pub fn contains_key<K: AsRef<str>>(&self, key: K) -> bool {
        self.index.contains_key(&key.as_ref().to_ascii_lowercase())
    }

    /// Removes `key` and returns its value.
    pub fn delete<K: AsRef<str>>(&mut self, key: K) -> Option<HeaderValue> {
        let lower = key.as_ref().to_ascii_lowercase();
        let idx = self.index.remove(&lower)?;
        let entry = self.entries.remove(idx);
        for position in self.index.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        Some(entry.value)
    }

    /// Display keys, each in the casing of its latest write.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &HeaderValue> {
        self.entries.iter().map(|entry| &entry.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|entry| (entry.key.as_str(), &entry.value))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Snapshot keyed by display key.
    pub fn to_map(&self) -> HashMap<String, HeaderValue> {
        self.entries.iter().map(|entry| (entry.key.clone(), entry.value.clone())).collect()
    }

    fn insert(&mut self, lower: String, key: String, value: HeaderValue) {
        self.index.insert(lower, self.entries.len());
        self.entries.push(Entry { key, value });
    }
}

/// Builds headers from a map-like source. `None` is stored as
/// [`HeaderValue::Absent`]; `Some` values are stored as given, a later pair with
/// the same case-insensitive key replaces an earlier one.
impl<K, V> FromIterator<(K, Option<V>)> for Headers
where
    K: AsRef<str>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (key, value) in iter {
            let key = key.as_ref();
            let lower = key.to_ascii_lowercase();
            let value = value.map_or(HeaderValue::Absent, Into::into);
            match headers.index.get(&lower) {
                Some(&idx) => headers.entries[idx] = Entry { key: key.to_owned(), value },
                None => headers.insert(lower, key.to_owned(), value),
            }
        }
        headers
    }
}
