use crate::base::{Error, Result};
use http::header::{HeaderName, HeaderValue};
use std::str::FromStr;

/// A case-normalized header map that preserves insertion order.
///
/// Insertion order matters for fingerprinting: the engine receives the header
/// names in the order they were added (`headerOrder` in the dispatch payload).
/// Keys are normalized to lowercase via [`HeaderName`]; a key may carry
/// multiple values, which read back joined with `,`.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    items: Vec<(HeaderName, Vec<HeaderValue>)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from `(name, value)` pairs, failing on any invalid pair.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value.as_ref())?;
        }
        Ok(headers)
    }

    /// Set a header, replacing any existing values for the same name.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_str(name).map_err(|_| Error::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader)?;
        if let Some((_, values)) = self.items.iter_mut().find(|(n, _)| *n == name) {
            *values = vec![value];
        } else {
            self.items.push((name, vec![value]));
        }
        Ok(())
    }

    /// Append a value, keeping existing values for the same name.
    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_str(name).map_err(|_| Error::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader)?;
        if let Some((_, values)) = self.items.iter_mut().find(|(n, _)| *n == name) {
            values.push(value);
        } else {
            self.items.push((name, vec![value]));
        }
        Ok(())
    }

    /// Set a header only if it is not already present.
    pub fn set_default(&mut self, name: &str, value: &str) -> Result<()> {
        if !self.contains(name) {
            self.insert(name, value)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        if let Ok(target) = HeaderName::from_str(name) {
            self.items.retain(|(n, _)| *n != target);
        }
    }

    /// Get a header value; multiple values read back joined with `,`.
    pub fn get(&self, name: &str) -> Option<String> {
        let target = HeaderName::from_str(name).ok()?;
        self.items.iter().find(|(n, _)| *n == target).map(|(_, values)| {
            values
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect::<Vec<_>>()
                .join(",")
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        match HeaderName::from_str(name) {
            Ok(target) => self.items.iter().any(|(n, _)| *n == target),
            Err(_) => false,
        }
    }

    /// Merge another set into this one. Names present in `other` replace the
    /// local values; everything else keeps its position.
    pub fn update(&mut self, other: &HeaderSet) {
        for (name, values) in &other.items {
            self.items.retain(|(n, _)| n != name);
            self.items.push((name.clone(), values.clone()));
        }
    }

    /// Header names in insertion order, as sent in the `headerOrder` payload field.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|(n, _)| n.as_str().to_string()).collect()
    }

    /// Flatten into `(name, joined-value)` pairs in insertion order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.items
            .iter()
            .map(|(n, values)| {
                let joined = values
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .collect::<Vec<_>>()
                    .join(",");
                (n.as_str().to_string(), joined)
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &Vec<HeaderValue>)> + '_ {
        self.items.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
