use super::{read_entries, RawEntry, Rotator, RotatorItem, Strategy};
use crate::base::Result;
use crate::http::HeaderSet;
use std::path::Path;

/// User-Agent strings backing the built-in header templates.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 11.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Linux; Android 14; SM-G998B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Mobile Safari/537.36",
];

/// One header template per built-in User-Agent.
pub fn default_templates() -> Vec<HeaderSet> {
    USER_AGENTS
        .iter()
        .filter_map(|ua| {
            HeaderSet::from_pairs([
                ("accept", "*/*"),
                ("connection", "keep-alive"),
                ("accept-encoding", "gzip, deflate, br, zstd"),
                ("user-agent", ua),
            ])
            .ok()
        })
        .collect()
}

impl RotatorItem for HeaderSet {}

/// A rotator over header templates.
///
/// Every draw returns an independent copy of the stored template, so callers
/// may freely mutate the result; the User-Agent override below never touches
/// the template itself. Defaults to the `Random` strategy.
pub struct HeaderRotator {
    inner: Rotator<HeaderSet>,
}

impl Default for HeaderRotator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HeaderRotator {
    /// Build from explicit templates; an empty list falls back to the
    /// built-in browser templates.
    pub fn new(templates: Vec<HeaderSet>) -> Self {
        Self::with_strategy(templates, Strategy::Random)
    }

    pub fn with_strategy(templates: Vec<HeaderSet>, strategy: Strategy) -> Self {
        let templates = if templates.is_empty() {
            default_templates()
        } else {
            templates
        };
        Self {
            inner: Rotator::new(templates, strategy),
        }
    }

    /// Load templates from a `.json` array of header objects. Entries that
    /// are not objects of string-ish values are dropped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_strategy(path, Strategy::Random)
    }

    pub fn from_file_with_strategy(path: impl AsRef<Path>, strategy: Strategy) -> Result<Self> {
        let templates = read_entries(path.as_ref())?
            .iter()
            .filter_map(Self::rebuild_item)
            .collect();
        Ok(Self::with_strategy(templates, strategy))
    }

    fn rebuild_item(entry: &RawEntry) -> Option<HeaderSet> {
        let object = match entry {
            RawEntry::Value(serde_json::Value::Object(object)) => object,
            _ => return None,
        };
        let mut headers = HeaderSet::new();
        for (name, value) in object {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            if headers.append(name, &rendered).is_err() {
                tracing::debug!(header = %name, "dropping header template with invalid entry");
                return None;
            }
        }
        Some(headers)
    }

    pub fn strategy(&self) -> Strategy {
        self.inner.strategy()
    }

    /// Draw a template copy, optionally overriding its User-Agent. The stored
    /// template is never modified.
    pub fn next(&self, user_agent: Option<&str>) -> Result<HeaderSet> {
        let mut headers = self.inner.next()?;
        if let Some(user_agent) = user_agent {
            headers.insert("user-agent", user_agent)?;
        }
        Ok(headers)
    }

    pub async fn anext(&self, user_agent: Option<&str>) -> Result<HeaderSet> {
        let mut headers = self.inner.anext().await?;
        if let Some(user_agent) = user_agent {
            headers.insert("user-agent", user_agent)?;
        }
        Ok(headers)
    }

    pub fn add(&self, template: HeaderSet) {
        self.inner.add(template);
    }

    pub async fn aadd(&self, template: HeaderSet) {
        self.inner.aadd(template).await;
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn items(&self) -> Vec<HeaderSet> {
        self.inner.items()
    }

    pub async fn aitems(&self) -> Vec<HeaderSet> {
        self.inner.aitems().await
    }
}
