use crate::error::StorageError;
use crate::storage::FileStorage;
use rustc_hash::FxHashMap;

/// Holds every scanned file's storage, keyed by lower-cased file path.
#[derive(Clone, Debug, Default)]
pub struct FileStorageProvider {
    storages: FxHashMap<String, FileStorage>,
}

impl FileStorageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_path: &str) -> Result<&FileStorage, StorageError> {
        self.storages
            .get(&file_path.to_lowercase())
            .ok_or_else(|| StorageError::MissingFile {
                path: file_path.to_string(),
            })
    }

    pub fn has(&self, file_path: &str) -> bool {
        self.storages.contains_key(&file_path.to_lowercase())
    }

    pub fn insert(&mut self, storage: FileStorage) {
        self.storages
            .insert(storage.file_path.to_lowercase(), storage);
    }

    pub fn get_mut(&mut self, file_path: &str) -> Option<&mut FileStorage> {
        self.storages.get_mut(&file_path.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileStorage> {
        self.storages.values()
    }
}
