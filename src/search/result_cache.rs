//! Durable memo of catalog search results.
//!
//! Entries never expire: a stale catalog answer keeps being served until the
//! file is removed or the schema version changes. The store assumes a single
//! writer at a time; concurrent processes sharing one file must coordinate
//! externally.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Candidate;

/// Bumped whenever the persisted layout or `Candidate` changes shape.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache corrupted: {0}")]
    Corruption(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub normalized_query: String,
    pub branded_only: bool,
}

impl CacheKey {
    pub fn new(normalized_query: impl Into<String>, branded_only: bool) -> Self {
        Self {
            normalized_query: normalized_query.into(),
            branded_only,
        }
    }
}

/// What happened when the store was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No file yet (or an in-memory cache).
    Fresh,
    Loaded { entries: usize },
    /// The file was unreadable or from another schema version and was ignored.
    Discarded { reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    #[serde(flatten)]
    key: CacheKey,
    candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCache {
    schema_version: u32,
    entries: Vec<PersistedEntry>,
}

#[derive(Deserialize)]
struct VersionHeader {
    schema_version: Option<u32>,
}

#[derive(Debug)]
pub struct ResultCache {
    storage_file: Option<PathBuf>,
    entries: HashMap<CacheKey, Vec<Candidate>>,
    load_outcome: LoadOutcome,
}

fn read_store(path: &Path) -> Result<HashMap<CacheKey, Vec<Candidate>>, CacheError> {
    let contents = fs::read_to_string(path)?;

    let header: VersionHeader = serde_json::from_str(&contents)
        .map_err(|e| CacheError::Corruption(format!("unreadable cache file: {}", e)))?;
    match header.schema_version {
        Some(CACHE_SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(CacheError::Corruption(format!(
                "schema version {} does not match expected {}",
                other, CACHE_SCHEMA_VERSION
            )))
        }
        None => return Err(CacheError::Corruption("missing schema_version".to_string())),
    }

    let persisted: PersistedCache = serde_json::from_str(&contents)
        .map_err(|e| CacheError::Corruption(format!("malformed cache entries: {}", e)))?;
    Ok(persisted
        .entries
        .into_iter()
        .map(|entry| (entry.key, entry.candidates))
        .collect())
}

impl ResultCache {
    /// Opens (or starts) the cache backed by `storage_file`. A corrupt or
    /// out-of-date file is never fatal: it is dropped and rebuilt as new
    /// searches come in.
    pub fn open(storage_file: impl Into<PathBuf>) -> Self {
        let storage_file = storage_file.into();
        let has_data = storage_file
            .metadata()
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        let (entries, load_outcome) = if !has_data {
            debug!(path = %storage_file.display(), "no cache file, starting fresh");
            (HashMap::new(), LoadOutcome::Fresh)
        } else {
            match read_store(&storage_file) {
                Ok(entries) => {
                    info!(path = %storage_file.display(), entries = entries.len(), "loaded search cache");
                    let count = entries.len();
                    (entries, LoadOutcome::Loaded { entries: count })
                }
                Err(e) => {
                    warn!(path = %storage_file.display(), error = %e, "discarding search cache");
                    (HashMap::new(), LoadOutcome::Discarded { reason: e.to_string() })
                }
            }
        };

        Self {
            storage_file: Some(storage_file),
            entries,
            load_outcome,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            storage_file: None,
            entries: HashMap::new(),
            load_outcome: LoadOutcome::Fresh,
        }
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    pub fn get(&self, key: &CacheKey) -> Option<&[Candidate]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Stores the result and writes the whole store through to disk. The
    /// in-memory entry is kept even if the write fails.
    pub fn put(&mut self, key: CacheKey, candidates: Vec<Candidate>) -> Result<(), CacheError> {
        self.entries.insert(key, candidates);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        self.save()
    }

    fn save(&self) -> Result<(), CacheError> {
        let Some(path) = &self.storage_file else {
            return Ok(());
        };

        let mut entries: Vec<PersistedEntry> = self
            .entries
            .iter()
            .map(|(key, candidates)| PersistedEntry {
                key: key.clone(),
                candidates: candidates.clone(),
            })
            .collect();
        // Stable file contents regardless of HashMap order.
        entries.sort_by(|a, b| {
            a.key
                .normalized_query
                .cmp(&b.key.normalized_query)
                .then(a.key.branded_only.cmp(&b.key.branded_only))
        });

        let serialized = serde_json::to_string_pretty(&PersistedCache {
            schema_version: CACHE_SCHEMA_VERSION,
            entries,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
