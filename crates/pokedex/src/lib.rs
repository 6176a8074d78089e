//! Pokédex: name index resolution, remote fetch and summary extraction
//!
//! The lookup never raises across the tool boundary. Internally every step
//! returns [`LookupError`]; [`Pokedex::lookup`] folds that into an
//! [`ErrorRecord`] so the agent sees failures as ordinary tool output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod index;
pub mod lookup;
pub mod record;
pub mod source;

pub use index::{DuplicatePolicy, IndexEntry, NameIndex};
pub use lookup::{LookupOutcome, Pokedex};
pub use record::{capitalize, Attribute, RemoteRecord, Summary, NOT_AVAILABLE};
pub use source::{HttpSource, RecordSource};

/// Lookup failures
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("no name provided")]
    EmptyName,

    #[error("index file missing: {}", .0.display())]
    IndexMissing(PathBuf),

    #[error("index file malformed: {}: {source}", .path.display())]
    IndexMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("index file unreadable: {}: {source}", .path.display())]
    IndexUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("name ambiguous: '{name}' matches {count} index entries")]
    Ambiguous { name: String, count: usize },

    #[error("name not found: '{0}'")]
    NotFound(String),

    #[error("fetch failed: HTTP {status} from {url}")]
    FetchFailed { status: u16, url: String },

    #[error("fetch error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, LookupError>;

/// Error taxonomy exposed at the tool boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "InputError")]
    Input,
    #[serde(rename = "IndexError")]
    Index,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "FetchError")]
    Fetch,
}

/// Tagged failure value returned in place of a summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::EmptyName => ErrorKind::Input,
            LookupError::IndexMissing(_)
            | LookupError::IndexMalformed { .. }
            | LookupError::IndexUnreadable { .. }
            | LookupError::Ambiguous { .. } => ErrorKind::Index,
            LookupError::NotFound(_) => ErrorKind::NotFound,
            LookupError::FetchFailed { .. } | LookupError::Transport(_) => ErrorKind::Fetch,
        }
    }

    /// Fixed reason text, stable across releases
    pub fn reason(&self) -> &'static str {
        match self {
            LookupError::EmptyName => "no name provided",
            LookupError::IndexMissing(_) => "index file missing",
            LookupError::IndexMalformed { .. } => "index file malformed",
            LookupError::IndexUnreadable { .. } => "index file unreadable",
            LookupError::Ambiguous { .. } => "name ambiguous",
            LookupError::NotFound(_) => "name not found",
            LookupError::FetchFailed { .. } => "fetch failed",
            LookupError::Transport(_) => "fetch error",
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            LookupError::EmptyName => None,
            LookupError::IndexMissing(path) => Some(path.display().to_string()),
            LookupError::IndexMalformed { source, .. } => Some(source.to_string()),
            LookupError::IndexUnreadable { source, .. } => Some(source.to_string()),
            LookupError::Ambiguous { name, count } => Some(format!("{} ({} entries)", name, count)),
            LookupError::NotFound(name) => Some(name.clone()),
            LookupError::FetchFailed { status, .. } => Some(status.to_string()),
            LookupError::Transport(e) => Some(e.to_string()),
        }
    }

    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord {
            kind: self.kind(),
            reason: self.reason().to_string(),
            detail: self.detail(),
        }
    }
}

impl From<LookupError> for ErrorRecord {
    fn from(err: LookupError) -> Self {
        err.to_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_record_has_no_detail() {
        let record = LookupError::EmptyName.to_record();
        assert_eq!(record.kind, ErrorKind::Input);
        assert_eq!(record.reason, "no name provided");
        assert!(record.detail.is_none());
    }

    #[test]
    fn test_fetch_failed_carries_status() {
        let err = LookupError::FetchFailed {
            status: 404,
            url: "https://pokeapi.co/api/v2/pokemon/0/".to_string(),
        };
        let record = err.to_record();
        assert_eq!(record.kind, ErrorKind::Fetch);
        assert_eq!(record.reason, "fetch failed");
        assert_eq!(record.detail.as_deref(), Some("404"));
    }

    #[test]
    fn test_index_kinds() {
        let missing = LookupError::IndexMissing(PathBuf::from("pokemon.json"));
        assert_eq!(missing.kind(), ErrorKind::Index);
        assert_eq!(missing.reason(), "index file missing");

        let ambiguous = LookupError::Ambiguous {
            name: "eevee".to_string(),
            count: 2,
        };
        assert_eq!(ambiguous.kind(), ErrorKind::Index);
        assert_eq!(ambiguous.reason(), "name ambiguous");
    }

    #[test]
    fn test_record_serialization_uses_taxonomy_names() {
        let record = LookupError::NotFound("Missingno123".to_string()).to_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "NotFoundError");
        assert_eq!(json["reason"], "name not found");
        assert_eq!(json["detail"], "Missingno123");
    }

    #[test]
    fn test_record_without_detail_omits_field() {
        let record = ErrorRecord::new(ErrorKind::Input, "no name provided");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("detail"));
    }
}
