//! Host-runtime builtin function table.
//!
//! Stands in for runtime reflection: a seeded set of builtin signatures,
//! plus lazy registration of configured predefined functions (which reflect
//! as `mixed`-returning).

use crate::storage::FunctionLikeStorage;
use dashmap::DashMap;
use stanza_types::{AtomicKind, Union};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Reflection {
    functions: DashMap<String, Arc<FunctionLikeStorage>>,
}

impl Reflection {
    pub fn new() -> Self {
        let reflection = Self::default();

        for (name, kind) in [
            ("strlen", AtomicKind::Int),
            ("count", AtomicKind::Int),
            ("rand", AtomicKind::Int),
            ("time", AtomicKind::Int),
            ("intval", AtomicKind::Int),
            ("floatval", AtomicKind::Float),
            ("microtime", AtomicKind::Float),
            ("sprintf", AtomicKind::String_),
            ("implode", AtomicKind::String_),
            ("trim", AtomicKind::String_),
            ("strval", AtomicKind::String_),
            ("uniqid", AtomicKind::String_),
            ("is_string", AtomicKind::Bool),
            ("is_int", AtomicKind::Bool),
            ("is_null", AtomicKind::Bool),
            ("exit", AtomicKind::Never),
            ("die", AtomicKind::Never),
        ] {
            reflection.insert(name, Union::of(kind));
        }

        reflection
    }

    fn insert(&self, name: &str, return_type: Union) {
        let storage = FunctionLikeStorage {
            cased_name: name.to_string(),
            return_type: Some(return_type.clone()),
            signature_return_type: Some(return_type),
            ..FunctionLikeStorage::default()
        };
        self.functions.insert(name.to_string(), Arc::new(storage));
    }

    pub fn has_function(&self, function_id: &str) -> bool {
        self.functions.contains_key(&function_id.to_lowercase())
    }

    pub fn get_function_storage(&self, function_id: &str) -> Option<Arc<FunctionLikeStorage>> {
        self.functions
            .get(&function_id.to_lowercase())
            .map(|entry| Arc::clone(&entry))
    }

    /// Admit a configured predefined function without signature knowledge.
    pub fn register_function(&self, function_id: &str) {
        self.insert(&function_id.to_lowercase(), Union::mixed());
    }
}
