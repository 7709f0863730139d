//! Shared identifier types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

/// Stable key of a catalog entry, normalized to its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Normalize a raw identifier. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Normalize a JSON scalar: strings and numbers are accepted.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(v) => Some(Self(v.to_string())),
                None => Self::parse(&n.to_string()),
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<u64> for EntryId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Identifiers known to carry the disclosure.
///
/// Grows monotonically: absence is never proven, so nothing is removed.
#[derive(Debug, Clone, Default)]
pub struct KnownPositiveSet {
    ids: HashSet<EntryId>,
}

impl KnownPositiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the identifier was not known before.
    pub fn insert(&mut self, id: EntryId) -> bool {
        self.ids.insert(id)
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = EntryId>) {
        self.ids.extend(ids);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryId> {
        self.ids.iter()
    }
}
