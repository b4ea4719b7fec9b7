//! Resolution of free-function references to their authoritative storage.

use crate::error::StorageError;
use crate::provider::{FileStorageProvider, FunctionExistenceProvider, FunctionReturnTypeProvider};
use crate::reflection::Reflection;
use crate::storage::FunctionLikeStorage;
use crate::stubs::StubRegistry;
use stanza_common::Config;
use std::sync::Arc;

/// Resolver for free functions.
///
/// Resolution order: stub registry, builtin reflection, the declaring-file
/// indirection in file storage, then the checked file as a fallback (a
/// function id may be declared in file A while only reachable for checking
/// in file B through a textual include). A function that is *expected* to
/// have storage but doesn't is a [`StorageError`] — a programming-error
/// signal, not a user-facing issue.
pub struct Functions {
    stubs: Arc<StubRegistry>,
    reflection: Reflection,
    pub existence_provider: FunctionExistenceProvider,
    pub return_type_provider: FunctionReturnTypeProvider,
}

impl Functions {
    pub fn new(stubs: Arc<StubRegistry>, reflection: Reflection) -> Self {
        Self {
            stubs,
            reflection,
            existence_provider: FunctionExistenceProvider::new(),
            return_type_provider: FunctionReturnTypeProvider::new(),
        }
    }

    pub fn get_storage(
        &self,
        files: &FileStorageProvider,
        function_id: &str,
        root_file_path: &str,
        checked_file_path: &str,
    ) -> Result<Arc<FunctionLikeStorage>, StorageError> {
        let key = function_id.to_lowercase();

        if let Some(stubbed) = self.stubs.get(&key) {
            return Ok(stubbed);
        }

        if let Some(reflected) = self.reflection.get_function_storage(&key) {
            return Ok(reflected);
        }

        if root_file_path.is_empty() || checked_file_path.is_empty() {
            return Err(StorageError::MissingFilePaths);
        }

        let file_storage = files.get(root_file_path)?;

        if let Some(storage) = file_storage.functions.get(&key) {
            return Ok(Arc::clone(storage));
        }

        let Some(declaring_file_path) = file_storage.declaring_function_ids.get(&key) else {
            // Declared nowhere in the root file; the checked file may still
            // know it.
            if checked_file_path != root_file_path {
                let checked_storage = files.get(checked_file_path)?;
                if let Some(storage) = checked_storage.functions.get(&key) {
                    return Ok(Arc::clone(storage));
                }
            }

            return Err(StorageError::MissingFunction {
                id: function_id.to_string(),
                path: checked_file_path.to_string(),
            });
        };

        let declaring_storage = files.get(declaring_file_path)?;

        declaring_storage
            .functions
            .get(&key)
            .map(Arc::clone)
            .ok_or_else(|| StorageError::MissingDeclaringFunction {
                id: function_id.to_string(),
                path: declaring_file_path.clone(),
            })
    }

    pub fn function_exists(
        &self,
        files: &FileStorageProvider,
        config: &Config,
        root_file_path: &str,
        function_id: &str,
    ) -> bool {
        let key = function_id.to_lowercase();

        if let Some(answer) = self.existence_provider.does_function_exist(&key) {
            return answer;
        }

        if let Ok(file_storage) = files.get(root_file_path) {
            if file_storage.declaring_function_ids.contains_key(&key) {
                return true;
            }
        }

        if self.reflection.has_function(&key) {
            return true;
        }

        if self.stubs.has_stubbed_function(&key) {
            return true;
        }

        if config.predefined_functions.contains(&key) {
            self.reflection.register_function(&key);
            return true;
        }

        false
    }

    pub fn is_variadic(
        &self,
        files: &FileStorageProvider,
        function_id: &str,
        file_path: &str,
    ) -> bool {
        let key = function_id.to_lowercase();

        let Ok(file_storage) = files.get(file_path) else {
            return false;
        };
        let Some(declaring_file_path) = file_storage.declaring_function_ids.get(&key) else {
            return false;
        };

        let declaring_storage = if declaring_file_path.eq_ignore_ascii_case(file_path) {
            Ok(file_storage)
        } else {
            files.get(declaring_file_path)
        };

        declaring_storage
            .ok()
            .and_then(|storage| storage.functions.get(&key))
            .is_some_and(|f| f.variadic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;

    fn function_storage(name: &str) -> FunctionLikeStorage {
        FunctionLikeStorage {
            cased_name: name.to_string(),
            ..FunctionLikeStorage::default()
        }
    }

    fn functions() -> Functions {
        Functions::new(Arc::new(StubRegistry::new()), Reflection::new())
    }

    #[test]
    fn stub_wins_over_file_storage() {
        let stubs = Arc::new(StubRegistry::new());
        let mut stubbed = function_storage("foo");
        stubbed.variadic = true;
        stubs.add_global_function("foo", stubbed);

        let resolver = Functions::new(Arc::clone(&stubs), Reflection::new());

        let mut files = FileStorageProvider::new();
        let mut file = FileStorage::new("/src/a.php");
        file.functions
            .insert("foo".to_string(), Arc::new(function_storage("foo")));
        file.declaring_function_ids
            .insert("foo".to_string(), "/src/a.php".to_string());
        files.insert(file);

        let storage = resolver
            .get_storage(&files, "Foo", "/src/a.php", "/src/a.php")
            .unwrap();
        assert!(storage.variadic);
    }

    #[test]
    fn resolves_through_declaring_file_indirection() {
        let resolver = functions();

        let mut files = FileStorageProvider::new();

        let mut declaring = FileStorage::new("/src/lib.php");
        declaring
            .functions
            .insert("helper".to_string(), Arc::new(function_storage("helper")));
        declaring
            .declaring_function_ids
            .insert("helper".to_string(), "/src/lib.php".to_string());
        files.insert(declaring);

        let mut root = FileStorage::new("/src/main.php");
        root.declaring_function_ids
            .insert("helper".to_string(), "/src/lib.php".to_string());
        files.insert(root);

        let storage = resolver
            .get_storage(&files, "helper", "/src/main.php", "/src/main.php")
            .unwrap();
        assert_eq!(storage.cased_name, "helper");
    }

    #[test]
    fn missing_storage_is_internal_error_not_issue() {
        let resolver = functions();
        let mut files = FileStorageProvider::new();
        files.insert(FileStorage::new("/src/a.php"));

        let result = resolver.get_storage(&files, "nope", "/src/a.php", "/src/a.php");
        assert!(matches!(result, Err(StorageError::MissingFunction { .. })));
    }

    #[test]
    fn predefined_function_registers_reflection_lazily() {
        let resolver = functions();
        let mut config = Config::default();
        config.predefined_functions.insert("ext_magic".to_string());

        let mut files = FileStorageProvider::new();
        files.insert(FileStorage::new("/src/a.php"));

        assert!(resolver.function_exists(&files, &config, "/src/a.php", "ext_magic"));
        // Now resolvable without the config consultation.
        assert!(
            resolver
                .get_storage(&files, "ext_magic", "/src/a.php", "/src/a.php")
                .is_ok()
        );
    }
}
