//! Content-hash keyed cache for serialized file storages.

use crate::storage::FileStorage;
use sha2::{Digest, Sha256};
use stanza_common::Config;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Bumped whenever the serialized storage layout changes; participates in
/// the dependency fingerprint so stale-schema entries never deserialize into
/// fresh runs.
pub const STORAGE_SCHEMA_VERSION: u32 = 1;

const FILE_STORAGE_CACHE_DIRECTORY: &str = "file_cache";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{path} must exist")]
    MissingDependency { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("could not serialize file storage: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Maps (file path, contents) to a previously computed [`FileStorage`].
///
/// Entries are invalidated whenever the file contents, the file path casing,
/// or the dependency fingerprint change. The fingerprint is computed once at
/// construction from the storage schema version, the modification times of
/// every configured stub/plugin file, and the configuration hash — so the
/// cache drops itself when the schema, an extension, or the config changes
/// even if the analyzed file is untouched.
#[derive(Debug)]
pub struct FileStorageCacheProvider {
    cache_dir: PathBuf,
    dependency_fingerprint: String,
}

impl FileStorageCacheProvider {
    pub fn new(cache_dir: PathBuf, config: &Config) -> Result<Self, CacheError> {
        let mut fingerprint = format!("schema:{STORAGE_SCHEMA_VERSION}");

        for dependent_file in &config.stub_files {
            if !dependent_file.exists() {
                return Err(CacheError::MissingDependency {
                    path: dependent_file.clone(),
                });
            }
            let mtime = fs::metadata(dependent_file)?
                .modified()?
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            fingerprint.push_str(&format!(" {mtime}"));
        }

        fingerprint.push_str(&config.hash);

        Ok(Self {
            cache_dir,
            dependency_fingerprint: fingerprint,
        })
    }

    /// Stamp the hash and serialize the storage.
    pub fn write_to_cache(
        &self,
        storage: &mut FileStorage,
        file_contents: &str,
    ) -> Result<(), CacheError> {
        let file_path = storage.file_path.to_lowercase();
        let cache_location = self.cache_location_for_path(&file_path, true)?;
        storage.hash = self.cache_hash(&file_path, file_contents);

        let serialized = serde_json::to_vec(storage)?;
        fs::write(cache_location, serialized)?;
        Ok(())
    }

    /// Load the cached storage for `file_path`, or `None` (deleting the
    /// stale entry) when the stored hash no longer matches or the entry does
    /// not deserialize into a complete storage.
    pub fn get_latest_from_cache(&self, file_path: &str, file_contents: &str) -> Option<FileStorage> {
        let file_path = file_path.to_lowercase();
        let cached = self.load_from_cache(&file_path)?;

        let cache_hash = self.cache_hash(&file_path, file_contents);
        if cached.hash != cache_hash {
            tracing::debug!(file = %file_path, "cache hash mismatch, evicting");
            self.remove_cache_for_file(&file_path);
            return None;
        }

        Some(cached)
    }

    pub fn remove_cache_for_file(&self, file_path: &str) {
        if let Ok(cache_path) = self.cache_location_for_path(&file_path.to_lowercase(), false) {
            if cache_path.exists() {
                let _ = fs::remove_file(cache_path);
            }
        }
    }

    fn cache_hash(&self, lowercased_path: &str, file_contents: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(lowercased_path.as_bytes());
        hasher.update(b" ");
        hasher.update(file_contents.as_bytes());
        hasher.update(self.dependency_fingerprint.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn load_from_cache(&self, lowercased_path: &str) -> Option<FileStorage> {
        let cache_location = self.cache_location_for_path(lowercased_path, false).ok()?;
        let bytes = fs::read(&cache_location).ok()?;

        match serde_json::from_slice::<FileStorage>(&bytes) {
            Ok(storage) => Some(storage),
            Err(error) => {
                tracing::debug!(file = %lowercased_path, %error, "cache entry corrupt, evicting");
                self.remove_cache_for_file(lowercased_path);
                None
            }
        }
    }

    fn cache_location_for_path(
        &self,
        lowercased_path: &str,
        create_directory: bool,
    ) -> Result<PathBuf, CacheError> {
        let cache_directory = self.cache_dir.join(FILE_STORAGE_CACHE_DIRECTORY);

        if create_directory && !cache_directory.is_dir() {
            fs::create_dir_all(&cache_directory)?;
        }

        let mut hasher = Sha256::new();
        hasher.update(lowercased_path.as_bytes());
        Ok(cache_directory.join(hex::encode(hasher.finalize())))
    }
}

impl FileStorageCacheProvider {
    /// Construct the provider for a config, if caching is enabled.
    pub fn for_config(config: &Config) -> Result<Option<Self>, CacheError> {
        match &config.cache_dir {
            Some(dir) => Ok(Some(Self::new(dir.clone(), config)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::storage::FileStorage;
    use std::sync::Arc;

    fn provider(dir: &Path) -> FileStorageCacheProvider {
        FileStorageCacheProvider::new(dir.to_path_buf(), &Config::default()).unwrap()
    }

    #[test]
    fn round_trip_returns_equal_storage() {
        let dir = tempfile::tempdir().unwrap();
        let cache = provider(dir.path());

        let mut storage = FileStorage::new("/src/A.php");
        storage
            .functions
            .insert("foo".to_string(), Arc::new(Default::default()));
        cache.write_to_cache(&mut storage, "<?php function foo() {}").unwrap();

        let cached = cache
            .get_latest_from_cache("/src/A.php", "<?php function foo() {}")
            .expect("hit");
        assert_eq!(cached.hash, storage.hash);
        assert!(cached.functions.contains_key("foo"));
    }

    #[test]
    fn changed_contents_miss_and_evict() {
        let dir = tempfile::tempdir().unwrap();
        let cache = provider(dir.path());

        let mut storage = FileStorage::new("/src/A.php");
        cache.write_to_cache(&mut storage, "v1").unwrap();

        assert!(cache.get_latest_from_cache("/src/A.php", "v2").is_none());
        // The stale entry was deleted: the original contents miss too now.
        assert!(cache.get_latest_from_cache("/src/A.php", "v1").is_none());
    }

    #[test]
    fn config_hash_participates_in_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let cache = provider(dir.path());

        let mut storage = FileStorage::new("/src/A.php");
        cache.write_to_cache(&mut storage, "v1").unwrap();

        let mut changed = Config::default();
        changed.hash = "other-config".to_string();
        let cache = FileStorageCacheProvider::new(dir.path().to_path_buf(), &changed).unwrap();
        assert!(cache.get_latest_from_cache("/src/A.php", "v1").is_none());
    }

    #[test]
    fn corrupt_entry_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = provider(dir.path());

        let mut storage = FileStorage::new("/src/A.php");
        cache.write_to_cache(&mut storage, "v1").unwrap();

        let entry = cache
            .cache_location_for_path("/src/a.php", false)
            .unwrap();
        fs::write(&entry, b"not json").unwrap();

        assert!(cache.get_latest_from_cache("/src/A.php", "v1").is_none());
        assert!(!entry.exists());
    }
}
