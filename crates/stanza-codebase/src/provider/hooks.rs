//! Hook-provider registries for members synthesized by extensions.
//!
//! Each registry is a strategy table keyed by lower-cased class name (or
//! function id): providers expose a `has` probe and a typed query, and are
//! consulted before any fallback to static storage. A hook answering `None`
//! defers to the next provider, then to storage.

use rustc_hash::FxHashMap;
use stanza_types::Union;
use std::sync::Arc;

pub trait PropertyExistenceHook: Send + Sync {
    fn property_exists(&self, class_name: &str, property_name: &str, read_mode: bool)
    -> Option<bool>;
}

pub trait PropertyTypeHook: Send + Sync {
    fn property_type(&self, class_name: &str, property_name: &str, read_mode: bool)
    -> Option<Union>;
}

pub trait FunctionExistenceHook: Send + Sync {
    fn function_exists(&self, function_id: &str) -> Option<bool>;
}

pub trait FunctionReturnTypeHook: Send + Sync {
    fn return_type(&self, function_id: &str) -> Option<Union>;
}

macro_rules! hook_registry {
    ($registry:ident, $hook:ident, $probe:ident, $query:ident ( $($arg:ident : $ty:ty),* ) -> $out:ty) => {
        #[derive(Clone, Default)]
        pub struct $registry {
            hooks: FxHashMap<String, Vec<Arc<dyn $hook>>>,
        }

        impl $registry {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn register(&mut self, key: &str, hook: Arc<dyn $hook>) {
                self.hooks.entry(key.to_lowercase()).or_default().push(hook);
            }

            pub fn has(&self, key: &str) -> bool {
                self.hooks.contains_key(&key.to_lowercase())
            }

            /// First non-`None` answer among the registered providers.
            pub fn $probe(&self, key: &str, $($arg: $ty),*) -> Option<$out> {
                self.hooks
                    .get(&key.to_lowercase())?
                    .iter()
                    .find_map(|hook| hook.$query(key, $($arg),*))
            }
        }

        impl std::fmt::Debug for $registry {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($registry))
                    .field("classes", &self.hooks.keys().collect::<Vec<_>>())
                    .finish()
            }
        }
    };
}

hook_registry!(
    PropertyExistenceProvider,
    PropertyExistenceHook,
    does_property_exist,
    property_exists(property_name: &str, read_mode: bool) -> bool
);

hook_registry!(
    PropertyTypeProvider,
    PropertyTypeHook,
    get_property_type,
    property_type(property_name: &str, read_mode: bool) -> Union
);

hook_registry!(
    FunctionReturnTypeProvider,
    FunctionReturnTypeHook,
    get_return_type,
    return_type() -> Union
);

// The function-existence registry keys by function id, so the query takes no
// extra arguments either.
hook_registry!(
    FunctionExistenceProvider,
    FunctionExistenceHook,
    does_function_exist,
    function_exists() -> bool
);

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_types::{AtomicKind, Union};

    struct MagicCount;

    impl PropertyExistenceHook for MagicCount {
        fn property_exists(
            &self,
            _class_name: &str,
            property_name: &str,
            _read_mode: bool,
        ) -> Option<bool> {
            (property_name == "count").then_some(true)
        }
    }

    impl PropertyTypeHook for MagicCount {
        fn property_type(
            &self,
            _class_name: &str,
            property_name: &str,
            read_mode: bool,
        ) -> Option<Union> {
            (property_name == "count" && read_mode).then(|| Union::of(AtomicKind::Int))
        }
    }

    #[test]
    fn providers_answer_before_storage() {
        let mut registry = PropertyExistenceProvider::new();
        registry.register("Collection", Arc::new(MagicCount));

        assert!(registry.has("collection"));
        assert_eq!(
            registry.does_property_exist("Collection", "count", true),
            Some(true)
        );
        assert_eq!(
            registry.does_property_exist("Collection", "items", true),
            None
        );
        assert!(!registry.has("Other"));
    }

    #[test]
    fn type_provider_models_read_write_asymmetry() {
        let mut registry = PropertyTypeProvider::new();
        registry.register("Collection", Arc::new(MagicCount));

        assert!(registry.get_property_type("Collection", "count", true).is_some());
        assert!(registry.get_property_type("Collection", "count", false).is_none());
    }
}
