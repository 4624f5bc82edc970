use cookie::Cookie;
use std::collections::HashMap;

/// An ordered cookie jar backing client defaults and per-request cookies.
///
/// Cookies travel to the engine as `{name, value}` pairs and come back from
/// it as a flat name/value map; attribute handling (path, expiry, ...) is the
/// `cookie` crate's job when parsing `Set-Cookie` strings.
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    jar: Vec<Cookie<'static>>,
}

impl Cookies {
    pub fn new() -> Self {
        Self { jar: Vec::new() }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut cookies = Self::new();
        for (name, value) in pairs {
            cookies.set(name, value);
        }
        cookies
    }

    /// Set a cookie, replacing any existing cookie with the same name.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let cookie = Cookie::new(name.into(), value.into());
        if let Some(existing) = self.jar.iter_mut().find(|c| c.name() == cookie.name()) {
            *existing = cookie;
        } else {
            self.jar.push(cookie);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.jar.iter().find(|c| c.name() == name).map(|c| c.value())
    }

    pub fn remove(&mut self, name: &str) {
        self.jar.retain(|c| c.name() != name);
    }

    /// Merge another jar into this one; same-name cookies are replaced.
    pub fn update(&mut self, other: &Cookies) {
        for cookie in &other.jar {
            self.set(cookie.name().to_string(), cookie.value().to_string());
        }
    }

    /// Parse and store a `Set-Cookie` header value.
    pub fn parse_set_cookie(&mut self, raw: &str) {
        if let Ok(cookie) = Cookie::parse(raw.to_string()) {
            self.set(cookie.name().to_string(), cookie.value().to_string());
        }
    }

    /// Absorb the name/value map the engine reply carries.
    pub(crate) fn extend_from_reply(&mut self, cookies: &HashMap<String, String>) {
        for (name, value) in cookies {
            self.set(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.jar.iter().map(|c| (c.name(), c.value()))
    }

    pub fn len(&self) -> usize {
        self.jar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jar.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut cookies = Cookies::new();
        cookies.set("session", "abc123");
        assert_eq!(cookies.get("session"), Some("abc123"));
    }

    #[test]
    fn test_set_replaces_same_name() {
        let mut cookies = Cookies::new();
        cookies.set("session", "old");
        cookies.set("session", "new");
        assert_eq!(cookies.get("session"), Some("new"));
        assert_eq!(cookies.len(), 1);
    }

    #[test]
    fn test_update_merges() {
        let mut base = Cookies::from_pairs([("a", "1"), ("b", "2")]);
        let patch = Cookies::from_pairs([("b", "3"), ("c", "4")]);
        base.update(&patch);
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
        assert_eq!(base.get("c"), Some("4"));
    }

    #[test]
    fn test_parse_set_cookie_keeps_name_value() {
        let mut cookies = Cookies::new();
        cookies.parse_set_cookie("token=xyz; Path=/; HttpOnly");
        assert_eq!(cookies.get("token"), Some("xyz"));
    }
}
