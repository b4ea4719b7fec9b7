use crate::storage::FunctionLikeStorage;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use stanza_common::CodeLocation;
use stanza_types::Union;
use std::sync::Arc;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PropertyStorage {
    pub ty: Option<Union>,
    pub is_static: bool,
    pub is_private: bool,
    pub location: Option<CodeLocation>,
}

/// Structural summary of one class, interface or trait.
///
/// The declaring/appearing/overridden maps are built once during the
/// inheritance-linking pass and never recomputed lazily:
///
/// - `declaring_property_ids`: member name → class the member is textually
///   defined in (a trait, for trait members).
/// - `appearing_property_ids`: member name → full property id on the class
///   the member surfaces in (the using class, for trait members).
/// - `overridden_property_ids`: member name → ordered ancestor property ids,
///   nearest ancestor first; ancestor walks for fallback typing use this
///   explicit list.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClassLikeStorage {
    pub name: String,
    /// Name reference only; resolved through the storage provider.
    pub parent_class: Option<String>,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub is_trait: bool,
    pub used_traits: Vec<String>,
    /// `@template` names declared on the class docblock.
    pub template_types: Vec<String>,

    pub properties: FxHashMap<String, PropertyStorage>,
    pub methods: FxHashMap<String, Arc<FunctionLikeStorage>>,

    pub declaring_property_ids: FxHashMap<String, String>,
    pub appearing_property_ids: FxHashMap<String, String>,
    pub overridden_property_ids: IndexMap<String, Vec<String>>,

    pub declaring_method_ids: FxHashMap<String, String>,
    pub appearing_method_ids: FxHashMap<String, String>,

    /// `@property-read` / `@property-write` pseudo types, modeling
    /// read/write asymmetry for magic properties.
    pub pseudo_property_get_types: FxHashMap<String, Union>,
    pub pseudo_property_set_types: FxHashMap<String, Union>,

    pub location: Option<CodeLocation>,
}

impl ClassLikeStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Full property id for a member appearing on this class.
    pub fn property_id(&self, property_name: &str) -> String {
        format!("{}::${}", self.name, property_name)
    }
}
