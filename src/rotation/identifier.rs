use super::{read_entries, RawEntry, Rotator, Strategy};
use crate::base::Result;
use std::path::Path;

/// TLS client identities the engine ships fingerprints for.
pub const TLS_IDENTIFIER_TEMPLATES: &[&str] = &[
    "chrome_120",
    "chrome_124",
    "chrome_131",
    "chrome_133",
    "firefox_120",
    "firefox_123",
    "firefox_132",
    "firefox_133",
    "safari_16_0",
    "safari_ios_16_0",
    "safari_ios_17_0",
    "safari_ios_18_0",
    "safari_ios_18_5",
];

/// A rotator over TLS client identifier strings.
///
/// Unlike the proxy and header rotators this one defaults to `RoundRobin`:
/// identity churn benefits from deterministic coverage of the whole pool
/// rather than independent random draws.
pub struct TlsIdentifierRotator {
    inner: Rotator<String>,
}

impl Default for TlsIdentifierRotator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TlsIdentifierRotator {
    /// Build from explicit identifiers; an empty list falls back to the
    /// built-in template set.
    pub fn new(identifiers: Vec<String>) -> Self {
        Self::with_strategy(identifiers, Strategy::RoundRobin)
    }

    pub fn with_strategy(identifiers: Vec<String>, strategy: Strategy) -> Self {
        let identifiers = if identifiers.is_empty() {
            TLS_IDENTIFIER_TEMPLATES
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            identifiers
        };
        Self {
            inner: Rotator::new(identifiers, strategy),
        }
    }

    /// Load identifiers from a newline text file or a `.json` array of
    /// strings. Non-string entries are dropped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_strategy(path, Strategy::RoundRobin)
    }

    pub fn from_file_with_strategy(path: impl AsRef<Path>, strategy: Strategy) -> Result<Self> {
        let identifiers = read_entries(path.as_ref())?
            .iter()
            .filter_map(Self::rebuild_item)
            .collect();
        Ok(Self::with_strategy(identifiers, strategy))
    }

    fn rebuild_item(entry: &RawEntry) -> Option<String> {
        match entry {
            RawEntry::Text(raw) => Some(raw.clone()),
            RawEntry::Value(serde_json::Value::String(raw)) => Some(raw.clone()),
            RawEntry::Value(other) => {
                tracing::debug!(entry = %other, "dropping non-string TLS identifier entry");
                None
            }
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.inner.strategy()
    }

    pub fn next(&self) -> Result<String> {
        self.inner.next()
    }

    pub async fn anext(&self) -> Result<String> {
        self.inner.anext().await
    }

    pub fn add(&self, identifier: String) {
        self.inner.add(identifier);
    }

    pub async fn aadd(&self, identifier: String) {
        self.inner.aadd(identifier).await;
    }

    pub fn remove(&self, identifier: &String) {
        self.inner.remove(identifier);
    }

    pub async fn aremove(&self, identifier: &String) {
        self.inner.aremove(identifier).await;
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn items(&self) -> Vec<String> {
        self.inner.items()
    }

    pub async fn aitems(&self) -> Vec<String> {
        self.inner.aitems().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_is_round_robin() {
        let rotator = TlsIdentifierRotator::default();
        assert_eq!(rotator.strategy(), Strategy::RoundRobin);
        assert_eq!(rotator.len(), TLS_IDENTIFIER_TEMPLATES.len());
    }

    #[test]
    fn test_round_robin_covers_pool_in_order() {
        let rotator =
            TlsIdentifierRotator::new(vec!["chrome_133".to_string(), "firefox_133".to_string()]);
        assert_eq!(rotator.next().unwrap(), "chrome_133");
        assert_eq!(rotator.next().unwrap(), "firefox_133");
        assert_eq!(rotator.next().unwrap(), "chrome_133");
    }
}
