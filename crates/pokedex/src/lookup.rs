//! The lookup pipeline: validate, resolve, fetch, extract

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::index::{DuplicatePolicy, NameIndex};
use crate::record::Summary;
use crate::source::{HttpSource, RecordSource};
use crate::{ErrorRecord, LookupError, Result};

/// Result of a lookup as seen across the tool boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupOutcome {
    Found(Summary),
    Failed { error: ErrorRecord },
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            LookupOutcome::Found(summary) => Some(summary),
            LookupOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        match self {
            LookupOutcome::Found(_) => None,
            LookupOutcome::Failed { error } => Some(error),
        }
    }
}

impl From<Result<Summary>> for LookupOutcome {
    fn from(result: Result<Summary>) -> Self {
        match result {
            Ok(summary) => LookupOutcome::Found(summary),
            Err(e) => LookupOutcome::Failed {
                error: e.to_record(),
            },
        }
    }
}

/// Stateless lookup over an index file and a record source
pub struct Pokedex<S = HttpSource> {
    index_path: PathBuf,
    policy: DuplicatePolicy,
    source: S,
}

impl Pokedex<HttpSource> {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self::with_source(index_path, HttpSource::new())
    }
}

impl<S: RecordSource> Pokedex<S> {
    pub fn with_source(index_path: impl Into<PathBuf>, source: S) -> Self {
        Self {
            index_path: index_path.into(),
            policy: DuplicatePolicy::default(),
            source,
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Resolve a name to its remote URL. Re-reads the index on every call.
    pub async fn resolve(&self, name: &str) -> Result<String> {
        if name.trim().is_empty() {
            return Err(LookupError::EmptyName);
        }

        let index = NameIndex::load(&self.index_path).await?;
        let entry = index.resolve(name, self.policy)?;
        debug!("Resolved '{}' to {}", name.trim(), entry.url);
        Ok(entry.url.clone())
    }

    pub async fn try_lookup(&self, name: &str) -> Result<Summary> {
        let url = self.resolve(name).await?;
        let record = self.source.fetch(&url).await?;
        Ok(record.summarize())
    }

    /// Never fails; errors come back as [`LookupOutcome::Failed`]
    pub async fn lookup(&self, name: &str) -> LookupOutcome {
        info!("Looking up Pokémon '{}'", name.trim());
        let result = self.try_lookup(name).await;
        if let Err(e) = &result {
            warn!("Lookup of '{}' failed: {}", name.trim(), e);
        }
        result.into()
    }
}
