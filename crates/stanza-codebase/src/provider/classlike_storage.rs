use crate::error::StorageError;
use crate::storage::ClassLikeStorage;
use rustc_hash::FxHashMap;
use stanza_types::HierarchyResolver;

/// Holds every known class-like's storage, keyed by lower-cased name.
///
/// Doubles as the [`HierarchyResolver`] for named-object containment:
/// descent is an explicit walk up `parent_class` references, which the scan
/// pass guarantees to be acyclic.
#[derive(Clone, Debug, Default)]
pub struct ClassLikeStorageProvider {
    storages: FxHashMap<String, ClassLikeStorage>,
}

impl ClassLikeStorageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Result<&ClassLikeStorage, StorageError> {
        self.storages
            .get(&name.to_lowercase())
            .ok_or_else(|| StorageError::MissingClassLike {
                name: name.to_string(),
            })
    }

    pub fn try_get(&self, name: &str) -> Option<&ClassLikeStorage> {
        self.storages.get(&name.to_lowercase())
    }

    pub fn has(&self, name: &str) -> bool {
        self.storages.contains_key(&name.to_lowercase())
    }

    pub fn insert(&mut self, storage: ClassLikeStorage) {
        self.storages.insert(storage.name.to_lowercase(), storage);
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassLikeStorage> {
        self.storages.get_mut(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.storages.keys().map(String::as_str)
    }
}

impl HierarchyResolver for ClassLikeStorageProvider {
    fn is_descendant_of(&self, child: &str, parent: &str) -> bool {
        let mut current = child.to_lowercase();
        let parent = parent.to_lowercase();

        while let Some(storage) = self.storages.get(&current) {
            if storage
                .used_traits
                .iter()
                .any(|t| t.to_lowercase() == parent)
            {
                return true;
            }
            match &storage.parent_class {
                Some(next) => {
                    let next = next.to_lowercase();
                    if next == parent {
                        return true;
                    }
                    current = next;
                }
                None => return false,
            }
        }

        false
    }
}
