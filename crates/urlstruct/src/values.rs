//! The raw, multi-valued parameter mapping fed to the decoder.

use std::collections::{HashMap, hash_map};

/// A mapping from parameter name to its values, in the order they appeared.
///
/// This is the shape produced by tokenizing a URL query string: a name may
/// repeat, and every occurrence contributes one value. The mapping itself has
/// no defined key order; code iterating over it, the decoder included, sees
/// names in an unspecified order.
///
/// # Example
///
/// ```ignore
/// let values = Values::parse("field=one&multi=1&multi=2");
/// assert_eq!(values.first("field"), Some("one"));
/// assert_eq!(values.get("multi").map(<[String]>::len), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values(HashMap<String, Vec<String>>);

impl Values {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self { Self(HashMap::new()) }

    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored. Names and values are percent-decoded.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    /// Returns all values of a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Returns the first value of a name.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    /// Appends a value to a name, creating the name if needed.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Replaces all values of a name.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.0.insert(name.into(), values.into_iter().map(Into::into).collect());
    }

    /// Returns `true` if the name is present, even with no values.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.0.contains_key(name) }

    /// Iterates over names and their values in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns `true` if there are no names.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl From<HashMap<String, Vec<String>>> for Values {
    fn from(map: HashMap<String, Vec<String>>) -> Self { Self(map) }
}

impl From<Values> for HashMap<String, Vec<String>> {
    fn from(values: Values) -> Self { values.0 }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        values.extend(iter);
        values
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Values {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.append(name, value);
        }
    }
}

impl IntoIterator for Values {
    type Item = (String, Vec<String>);
    type IntoIter = hash_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}
