//! The stub-function override table.
//!
//! Highest-priority source for function storages, keyed case-insensitively.
//! Modeled as an explicitly injected, lifetime-scoped registry (not implicit
//! global state); `clear` exists for test isolation. Within one process the
//! registry is shared; worker threads inherit the pre-fork snapshot and
//! never observe later writes from the coordinator.

use crate::storage::FunctionLikeStorage;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct StubRegistry {
    functions: DashMap<String, Arc<FunctionLikeStorage>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global_function(&self, function_id: &str, storage: FunctionLikeStorage) {
        self.functions
            .insert(function_id.to_lowercase(), Arc::new(storage));
    }

    pub fn has_stubbed_function(&self, function_id: &str) -> bool {
        self.functions.contains_key(&function_id.to_lowercase())
    }

    pub fn get(&self, function_id: &str) -> Option<Arc<FunctionLikeStorage>> {
        self.functions
            .get(&function_id.to_lowercase())
            .map(|entry| Arc::clone(&entry))
    }

    pub fn clear(&self) {
        self.functions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let stubs = StubRegistry::new();
        stubs.add_global_function("Array_Map", FunctionLikeStorage::default());
        assert!(stubs.has_stubbed_function("array_map"));
        assert!(stubs.get("ARRAY_MAP").is_some());

        stubs.clear();
        assert!(!stubs.has_stubbed_function("array_map"));
    }
}
