//! Content-addressed memoization cache.
//!
//! Flat JSON records on disk, one file per entry, keyed by a hex content
//! hash under a fixed namespace prefix. Intended for inputs that repeat
//! unchanged across calls (the contract document path) and deliberately
//! bypassed for inputs that vary run to run, where freshness matters more
//! than memoization.
//!
//! Failure posture: `get` never errors (absent or unreadable entries are
//! misses), and `put` never surfaces a failure to the caller: a write
//! that fails for lack of space clears the whole namespace and retries
//! once. Concurrent identical requests are not deduplicated; both callers
//! do the work and the last writer wins, which is idempotent for a
//! content-addressed key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Namespace prefix for every record file. There is no schema versioning;
/// bumping this string retires the old namespace wholesale.
pub const NAMESPACE_PREFIX: &str = "audit_cache_v1_";

/// Default bound on stored entries before least-recently-used eviction.
const DEFAULT_CAPACITY: usize = 256;

/// One memoized analysis record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hex content hash of the input document(s).
    pub hash: String,
    /// When this entry was first stored.
    pub timestamp: DateTime<Utc>,
    /// The memoized analysis payload.
    pub payload: Value,
    /// Which model produced the payload.
    pub model_tag: String,
}

/// File-backed, bounded, content-hash-keyed store.
pub struct AnalysisCache {
    root: PathBuf,
    capacity: usize,
}

impl AnalysisCache {
    /// Create a cache rooted at `root`. The directory is created lazily
    /// on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Override the entry bound.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Cache under the platform cache directory (`<cache_dir>/roundtable`).
    pub fn at_default_location() -> Option<Self> {
        dirs::cache_dir().map(|dir| Self::new(dir.join("roundtable")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a memoized payload. Absent and unreadable entries are both
    /// misses; this never returns an error.
    pub fn get(&self, hash: &str) -> Option<CacheEntry> {
        let path = self.entry_path(hash);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                debug!(hash = %short(hash), "cache hit");
                touch(&path);
                Some(entry)
            }
            Err(e) => {
                warn!(hash = %short(hash), error = %e, "discarding corrupt cache entry");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Store a payload, overwriting any previous entry for `hash`
    /// wholesale. On a write failure the whole namespace is cleared and
    /// the write retried once; failures are logged, never surfaced.
    pub fn put(&self, hash: &str, payload: Value, model_tag: &str) {
        let entry = CacheEntry {
            hash: hash.to_string(),
            timestamp: Utc::now(),
            payload,
            model_tag: model_tag.to_string(),
        };
        let Ok(serialized) = serde_json::to_string(&entry) else {
            warn!(hash = %short(hash), "cache entry not serializable, skipping");
            return;
        };

        let path = self.entry_path(hash);
        let is_new = !path.exists();
        if is_new {
            self.evict_to_fit();
        }

        if let Err(first) = self.write_entry(&path, &serialized) {
            // Storage pressure: destructive clear, then one retry.
            warn!(hash = %short(hash), error = %first, "cache write failed, clearing namespace and retrying");
            self.clear();
            if let Err(second) = self.write_entry(&path, &serialized) {
                warn!(hash = %short(hash), error = %second, "cache write failed after clear, giving up");
            }
        } else {
            debug!(hash = %short(hash), "cache store");
        }
    }

    /// Remove every record in the namespace.
    pub fn clear(&self) {
        for path in self.namespace_files() {
            let _ = fs::remove_file(path);
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.namespace_files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_path(&self, hash: &str) -> PathBuf {
        self.root.join(format!("{NAMESPACE_PREFIX}{hash}.json"))
    }

    fn write_entry(&self, path: &Path, serialized: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(path, serialized)
    }

    fn namespace_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(NAMESPACE_PREFIX))
            })
            .collect()
    }

    /// Drop least-recently-used records until a new entry fits the bound.
    fn evict_to_fit(&self) {
        let mut files: Vec<(SystemTime, PathBuf)> = self
            .namespace_files()
            .into_iter()
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .collect();
        if files.len() < self.capacity {
            return;
        }
        files.sort_by_key(|(modified, _)| *modified);
        let excess = files.len() + 1 - self.capacity;
        for (_, path) in files.into_iter().take(excess) {
            debug!(path = %path.display(), "evicting least-recently-used cache entry");
            let _ = fs::remove_file(path);
        }
    }
}

/// Best-effort recency bump for LRU ordering.
fn touch(path: &Path) {
    if let Ok(file) = fs::OpenOptions::new().append(true).open(path) {
        let _ = file.set_modified(SystemTime::now());
    }
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}
