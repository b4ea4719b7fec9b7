use crate::storage::{ClassLikeStorage, FunctionLikeStorage};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Structural summary of one scanned file.
///
/// This is the cache unit: the whole struct (class storages included, so a
/// cache hit skips re-parsing entirely) serializes into one cache entry with
/// the content hash stamped into `hash`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileStorage {
    pub file_path: String,
    /// Content+dependency hash stamped by the cache provider on write.
    pub hash: String,
    /// Free functions declared in this file, keyed by lower-cased id.
    pub functions: FxHashMap<String, Arc<FunctionLikeStorage>>,
    /// Function id → file path the function is declared in. A function can
    /// be reachable for checking in this file while being declared in
    /// another (textual include).
    pub declaring_function_ids: FxHashMap<String, String>,
    /// Class-like storages declared in this file, pre-linking.
    pub classlike_storages: Vec<ClassLikeStorage>,
    /// Names of the class-likes above, lower-cased.
    pub classlikes: Vec<String>,
}

impl FileStorage {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }
}
