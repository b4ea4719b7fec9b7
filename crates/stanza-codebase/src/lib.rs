//! Symbol/type database for the stanza PHP type checker.
//!
//! The codebase owns everything the checker resolves against: per-file and
//! per-class storages built by the scan pass, the function and property
//! resolvers with their hook-provider registries, the stub override table,
//! the reference index, and the content-hash file cache.

pub mod error;
pub mod functions;
pub mod properties;
pub mod provider;
pub mod reflection;
pub mod scanner;
pub mod storage;
pub mod stubs;

pub use error::StorageError;
pub use functions::Functions;
pub use properties::{Properties, Referencer};
pub use provider::{
    CacheError, ClassLikeStorageProvider, FileStorageCacheProvider, FileStorageProvider,
    ReferenceIndex, STORAGE_SCHEMA_VERSION,
};
pub use reflection::Reflection;
pub use storage::{
    ClassLikeStorage, FileStorage, FunctionLikeStorage, ParamStorage, PropertyStorage,
};
pub use stubs::StubRegistry;

use stanza_common::Config;
use stanza_parser::FileAst;
use std::sync::Arc;

/// The assembled symbol/type database.
pub struct Codebase {
    pub config: Arc<Config>,
    pub files: FileStorageProvider,
    pub classlikes: ClassLikeStorageProvider,
    pub references: ReferenceIndex,
    pub functions: Functions,
    pub properties: Properties,
}

impl Codebase {
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_stubs(config, Arc::new(StubRegistry::new()))
    }

    pub fn with_stubs(config: Arc<Config>, stubs: Arc<StubRegistry>) -> Self {
        Self {
            config,
            files: FileStorageProvider::new(),
            classlikes: ClassLikeStorageProvider::new(),
            references: ReferenceIndex::new(),
            functions: Functions::new(stubs, Reflection::new()),
            properties: Properties::new(),
        }
    }

    /// Scan one parsed file into fresh storage and register it.
    pub fn scan_file(&mut self, ast: &FileAst) -> FileStorage {
        let storage = scanner::scan_file(ast);
        self.add_file_storage(storage.clone());
        storage
    }

    /// Register an already-built file storage (fresh or from cache).
    pub fn add_file_storage(&mut self, storage: FileStorage) {
        for classlike in &storage.classlike_storages {
            self.classlikes.insert(classlike.clone());
        }
        self.files.insert(storage);
    }

    /// Run the inheritance-linking pass. Call once, after every file is
    /// registered and before analysis starts.
    pub fn link(&mut self) {
        scanner::link_codebase(&mut self.classlikes);
    }

    /// Resolve a method to its declaring storage.
    pub fn get_method_storage(
        &self,
        class_name: &str,
        method_name: &str,
    ) -> Result<Arc<FunctionLikeStorage>, StorageError> {
        let method_key = method_name.to_lowercase();
        let class_storage = self.classlikes.get(class_name)?;

        let declaring_class = class_storage
            .declaring_method_ids
            .get(&method_key)
            .cloned()
            .unwrap_or_else(|| class_storage.name.clone());

        let declaring_storage = self.classlikes.get(&declaring_class)?;
        declaring_storage
            .methods
            .get(&method_key)
            .map(Arc::clone)
            .ok_or_else(|| StorageError::MissingFunction {
                id: format!("{class_name}::{method_key}"),
                path: declaring_class,
            })
    }
}
