//! Table Cache Module
//! Memoizes loaded collision tables by source path and row count.
//!
//! Each source file holds one entry: loading it with a different row count
//! replaces the previous table. An entry is reused only while the file's
//! modification time is unchanged, and the least recently used file is
//! evicted once the cache is full.

use crate::data::loader::{DataLoader, LoaderError};
use crate::data::record::CollisionTable;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;
use tracing::{debug, info};

/// Source files kept by [`TableCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 2;

struct CacheEntry {
    nrows: usize,
    modified: SystemTime,
    last_used: u64,
    table: Arc<CollisionTable>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<PathBuf, CacheEntry>,
    clock: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Shared cache of cleaned tables. Safe to use from the loader thread.
pub struct TableCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Default for TableCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` source files (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Return the cached table for `(path, nrows)`, loading it when absent,
    /// when it was cached with another row count, or when the file changed.
    pub fn get_or_load(
        &self,
        path: &Path,
        nrows: usize,
    ) -> Result<Arc<CollisionTable>, LoaderError> {
        let modified = Self::modified_time(path)?;
        let key = Self::canonical(path);

        {
            let mut state = self.lock();
            let now = state.tick();
            if let Some(entry) = state.entries.get_mut(&key) {
                if entry.nrows == nrows && entry.modified == modified {
                    debug!(path = %path.display(), nrows, "table cache hit");
                    entry.last_used = now;
                    return Ok(Arc::clone(&entry.table));
                }
                info!(path = %path.display(), nrows, "source or row count changed, reloading");
            }
        }

        let table = Arc::new(DataLoader::load_data(path, nrows)?);

        let mut state = self.lock();
        state.entries.remove(&key);
        while state.entries.len() >= self.capacity {
            let Some(oldest) = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(path, _)| path.clone())
            else {
                break;
            };
            debug!(path = %oldest.display(), "evicting cached table");
            state.entries.remove(&oldest);
        }
        let last_used = state.tick();
        state.entries.insert(
            key,
            CacheEntry {
                nrows,
                modified,
                last_used,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop the entry for `path`.
    pub fn invalidate(&self, path: &Path) {
        self.lock().entries.remove(&Self::canonical(path));
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of cached source files.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn canonical(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // a panicked loader leaves the map itself consistent
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn modified_time(path: &Path) -> Result<SystemTime, LoaderError> {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| LoaderError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    const HEADER: &str = "CRASH_DATE,CRASH_TIME,LATITUDE,LONGITUDE,ON_STREET_NAME,\
INJURED_PERSONS,INJURED_PEDESTRIANS,INJURED_CYCLISTS,INJURED_MOTORISTS";

    fn write_rows(path: &Path, rows: &[&str]) {
        let mut file = File::create(path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    #[test]
    fn test_second_load_is_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        write_rows(&path, &["01/01/2020,08:15,40.7,-73.9,BROADWAY,1,1,0,0"]);

        let cache = TableCache::new();
        let first = cache.get_or_load(&path, 100).unwrap();
        let second = cache.get_or_load(&path, 100).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_new_row_count_replaces_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        write_rows(
            &path,
            &[
                "01/01/2020,08:15,40.7,-73.9,BROADWAY,1,1,0,0",
                "01/01/2020,09:15,40.8,-73.9,BROADWAY,1,1,0,0",
            ],
        );

        let cache = TableCache::new();
        let one = cache.get_or_load(&path, 1).unwrap();
        let two = cache.get_or_load(&path, 2).unwrap();

        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(cache.len(), 1);

        let again = cache.get_or_load(&path, 2).unwrap();
        assert!(Arc::ptr_eq(&two, &again));
    }

    #[test]
    fn test_one_entry_per_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        write_rows(&path, &["01/01/2020,08:15,40.7,-73.9,BROADWAY,1,1,0,0"]);

        let cache = TableCache::new();
        for nrows in 1..=50 {
            cache.get_or_load(&path, nrows).unwrap();
        }

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_least_recently_used_source_is_evicted() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = ["a.csv", "b.csv", "c.csv"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                write_rows(&path, &["01/01/2020,08:15,40.7,-73.9,BROADWAY,1,1,0,0"]);
                path
            })
            .collect();

        let cache = TableCache::with_capacity(2);
        let a = cache.get_or_load(&paths[0], 10).unwrap();
        let b = cache.get_or_load(&paths[1], 10).unwrap();
        cache.get_or_load(&paths[0], 10).unwrap();
        cache.get_or_load(&paths[2], 10).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(Arc::ptr_eq(&a, &cache.get_or_load(&paths[0], 10).unwrap()));
        assert!(!Arc::ptr_eq(&b, &cache.get_or_load(&paths[1], 10).unwrap()));
    }

    #[test]
    fn test_modified_source_is_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        write_rows(&path, &["01/01/2020,08:15,40.7,-73.9,BROADWAY,1,1,0,0"]);

        let cache = TableCache::new();
        let first = cache.get_or_load(&path, 100).unwrap();

        write_rows(
            &path,
            &[
                "01/01/2020,08:15,40.7,-73.9,BROADWAY,1,1,0,0",
                "01/01/2020,09:15,40.8,-73.9,BROADWAY,1,1,0,0",
            ],
        );
        let later = SystemTime::now() + Duration::from_secs(5);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = cache.get_or_load(&path, 100).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_invalidate_removes_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        write_rows(&path, &["01/01/2020,08:15,40.7,-73.9,BROADWAY,1,1,0,0"]);

        let cache = TableCache::new();
        cache.get_or_load(&path, 10).unwrap();
        cache.get_or_load(&path, 20).unwrap();
        cache.invalidate(&path);

        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_error_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = TableCache::new();

        assert!(cache.get_or_load(&dir.path().join("missing.csv"), 10).is_err());
        assert!(cache.is_empty());
    }
}
