//! Parameters extracted from a matched path.

use std::ops::Index;

/// A single path parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// The parameters bound while matching a path, in binding order.
///
/// The matcher only ever appends; backtracking rolls the list back to an
/// earlier [`len`](Params::len). When the same key is bound twice the later
/// value wins on lookup.
/// ```rust
/// use segrouter::Params;
///
/// let mut params = Params::default();
/// params.insert("id", "1");
/// params.insert("id", "2");
/// assert_eq!(params.get("id"), Some("2"));
/// assert_eq!(params[0].value, "1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    params: Vec<Param>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value bound to `key`, if any.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params
            .iter()
            .rev()
            .find(|param| param.key == key)
            .map(|param| param.value.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push(Param {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// Drop every binding made after the list had `len` entries.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.params.truncate(len);
    }
}

impl Index<usize> for Params {
    type Output = Param;

    fn index(&self, i: usize) -> &Param {
        &self.params[i]
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
