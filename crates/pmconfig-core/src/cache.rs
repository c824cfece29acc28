//! In-process document cache.
//!
//! Entries are keyed by absolute path and stamped with the file's
//! modification time and length at read. A lookup whose stamp no longer
//! matches the file on disk drops the entry.
//!
//! Filesystem mtime resolution can be coarser than the gap between two
//! writes in a fast loop. Comparing the length as well narrows the window
//! but does not close it: an out-of-band rewrite with identical length
//! inside one mtime tick can be served stale. Writes through the store
//! always evict explicitly and are not affected.

use crate::schema::Schema;
use crate::validate::ValidationMode;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

// ---------------------------------------------------------------------------
// FileStamp
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: SystemTime,
    pub len: u64,
}

impl FileStamp {
    pub fn of(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// ConfigDocument
// ---------------------------------------------------------------------------

/// Normalized form of a document that passed validation against `schema`.
#[derive(Debug, Clone)]
pub struct Validated {
    pub schema: Schema,
    pub mode: ValidationMode,
    pub value: Arc<Value>,
}

/// One parsed YAML file.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub raw: Arc<Value>,
    pub validated: Option<Validated>,
    /// Source file size in bytes.
    pub size: u64,
}

impl ConfigDocument {
    /// The cached validated form, if it was produced by an identical
    /// schema in the same mode. Schemas sharing a name do not match.
    pub fn validated_for(&self, schema: &Schema, mode: ValidationMode) -> Option<Arc<Value>> {
        self.validated
            .as_ref()
            .filter(|v| v.mode == mode && &v.schema == schema)
            .map(|v| Arc::clone(&v.value))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    document: ConfigDocument,
    stamp: FileStamp,
}

// ---------------------------------------------------------------------------
// CacheStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub paths: Vec<PathBuf>,
    /// Sum of source file sizes; doubled for entries that also hold a
    /// validated form.
    pub approx_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub disk_reads: u64,
}

// ---------------------------------------------------------------------------
// ConfigCache
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<PathBuf, CacheEntry>,
    hits: u64,
    misses: u64,
    disk_reads: u64,
}

/// Document cache owned by a single store instance.
#[derive(Debug, Default)]
pub struct ConfigCache {
    state: Mutex<CacheState>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached document if its stamp still matches `current`.
    /// A stale entry is evicted.
    pub fn lookup(&self, path: &Path, current: FileStamp) -> Option<ConfigDocument> {
        let mut state = self.state();
        let fresh = state
            .entries
            .get(path)
            .filter(|e| e.stamp == current)
            .map(|e| e.document.clone());
        if fresh.is_none() && state.entries.remove(path).is_some() {
            tracing::debug!(path = %path.display(), "cache entry stale");
        }
        if fresh.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        fresh
    }

    pub fn insert(&self, path: PathBuf, document: ConfigDocument, stamp: FileStamp) {
        self.state()
            .entries
            .insert(path, CacheEntry { document, stamp });
    }

    /// Attach a validated form to an existing entry, if it is still the
    /// same file version.
    pub fn attach_validated(&self, path: &Path, stamp: FileStamp, validated: Validated) {
        if let Some(entry) = self.state().entries.get_mut(path) {
            if entry.stamp == stamp {
                entry.document.validated = Some(validated);
            }
        }
    }

    pub fn record_read(&self) {
        self.state().disk_reads += 1;
    }

    /// Evict one entry. Returns true if it was cached.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.state().entries.remove(path).is_some()
    }

    pub fn clear(&self) {
        self.state().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state();
        let mut paths: Vec<PathBuf> = state.entries.keys().cloned().collect();
        paths.sort();
        let approx_bytes = state
            .entries
            .values()
            .map(|e| {
                let copies = if e.document.validated.is_some() { 2 } else { 1 };
                e.document.size * copies
            })
            .sum();
        CacheStats {
            paths,
            approx_bytes,
            hits: state.hits,
            misses: state.misses,
            disk_reads: state.disk_reads,
        }
    }
}
