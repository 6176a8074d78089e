//! Name index: local `{name, url}` records

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::{LookupError, Result};

/// One index record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub url: String,
}

impl IndexEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Tie-break when several entries share a name (ignoring case)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Earliest entry in file order wins
    #[default]
    First,
    /// Latest entry in file order wins
    Last,
    /// More than one match is an error
    Reject,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(DuplicatePolicy::First),
            "last" => Ok(DuplicatePolicy::Last),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(format!("unknown duplicate policy '{}'", other)),
        }
    }
}

/// Ordered name-to-endpoint index
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: Vec<IndexEntry>,
}

impl NameIndex {
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array of `{name, url}` records
    pub fn parse(bytes: &[u8]) -> serde_json::Result<Self> {
        let entries: Vec<IndexEntry> = serde_json::from_slice(bytes)?;
        Ok(Self { entries })
    }

    /// Read and parse the index file. Never cached.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LookupError::IndexMissing(path.to_path_buf())
            } else {
                LookupError::IndexUnreadable {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let index = Self::parse(&bytes).map_err(|e| LookupError::IndexMalformed {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("Loaded {} index entries from {:?}", index.len(), path);
        Ok(index)
    }

    /// Case-insensitive match, surrounding whitespace ignored.
    /// Entries with a blank `url` never match.
    pub fn resolve(&self, name: &str, policy: DuplicatePolicy) -> Result<&IndexEntry> {
        let wanted = name.trim().to_lowercase();
        let mut matches = self
            .entries
            .iter()
            .filter(|entry| !entry.url.trim().is_empty())
            .filter(|entry| entry.name.to_lowercase() == wanted);

        let found = match policy {
            DuplicatePolicy::First => matches.next(),
            DuplicatePolicy::Last => matches.last(),
            DuplicatePolicy::Reject => {
                let all: Vec<&IndexEntry> = matches.collect();
                if all.len() > 1 {
                    return Err(LookupError::Ambiguous {
                        name: name.trim().to_string(),
                        count: all.len(),
                    });
                }
                all.into_iter().next()
            }
        };

        found.ok_or_else(|| LookupError::NotFound(name.trim().to_string()))
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
