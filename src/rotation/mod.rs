//! Outbound traffic rotation: proxies, TLS identities, header templates.
//!
//! The generic [`Rotator`] serializes all access through one lock and offers
//! both blocking and task-suspending entry points; the specializations add
//! typed parsing and, for proxies, adaptive weighting from request feedback.

pub mod headers;
pub mod identifier;
pub mod proxy;
pub mod rotator;

pub use headers::HeaderRotator;
pub use identifier::TlsIdentifierRotator;
pub use proxy::{Proxy, ProxyRotator, ProxyScheme};
pub use rotator::{Rotator, RotatorItem};

use crate::base::{Error, Result};
use std::path::Path;

/// Strategy for selecting the next item from a rotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Uniformly random selection, no shared cursor.
    #[default]
    Random,
    /// Insertion order, wrapping infinitely.
    RoundRobin,
    /// Probability proportional to each item's weight, with replacement.
    Weighted,
}

impl Strategy {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "round_robin" | "roundrobin" | "round-robin" => Self::RoundRobin,
            "weighted" => Self::Weighted,
            _ => Self::Random,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::RoundRobin => "round_robin",
            Self::Weighted => "weighted",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw rotator source entry before the type-specific rebuild hook runs.
#[derive(Debug, Clone)]
pub(crate) enum RawEntry {
    Text(String),
    Value(serde_json::Value),
}

/// Read a rotator source file.
///
/// `.json` files must hold a top-level array; anything else is treated as
/// newline-delimited text with `#` comments stripped and blank lines skipped.
pub(crate) fn read_entries(path: &Path) -> Result<Vec<RawEntry>> {
    let raw = std::fs::read_to_string(path)?;
    if path.extension().map(|e| e == "json").unwrap_or(false) {
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        match value {
            serde_json::Value::Array(items) => Ok(items.into_iter().map(RawEntry::Value).collect()),
            _ => Err(Error::RotatorSource(format!(
                "{} must hold a JSON array",
                path.display()
            ))),
        }
    } else {
        Ok(raw
            .lines()
            .filter_map(|line| {
                let content = line.split('#').next().unwrap_or("").trim();
                if content.is_empty() {
                    None
                } else {
                    Some(RawEntry::Text(content.to_string()))
                }
            })
            .collect())
    }
}
