//! Storage providers, hook registries and the file-storage cache.

mod classlike_storage;
mod file_reference;
mod file_storage;
mod file_storage_cache;
mod hooks;

pub use classlike_storage::ClassLikeStorageProvider;
pub use file_reference::ReferenceIndex;
pub use file_storage::FileStorageProvider;
pub use file_storage_cache::{CacheError, FileStorageCacheProvider, STORAGE_SCHEMA_VERSION};
pub use hooks::{
    FunctionExistenceHook, FunctionExistenceProvider, FunctionReturnTypeHook,
    FunctionReturnTypeProvider, PropertyExistenceHook, PropertyExistenceProvider,
    PropertyTypeHook, PropertyTypeProvider,
};
