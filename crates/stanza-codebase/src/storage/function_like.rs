use serde::{Deserialize, Serialize};
use stanza_common::CodeLocation;
use stanza_types::Union;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParamStorage {
    pub name: String,
    pub ty: Option<Union>,
    pub variadic: bool,
}

/// Structural summary of one function, method or closure declaration.
///
/// `return_type` is the docblock-preferred declared type (docblock wins over
/// the native signature when both exist); `signature_return_type` is the
/// native signature type alone. Created once per declaration during the scan
/// pass; immutable afterwards except for the auto-fix path's controlled
/// in-place rewrite of `return_type`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FunctionLikeStorage {
    /// Name as written, e.g. `foo` or `Foo::bar`, for messages.
    pub cased_name: String,
    pub params: Vec<ParamStorage>,
    pub return_type: Option<Union>,
    pub return_type_location: Option<CodeLocation>,
    pub signature_return_type: Option<Union>,
    pub signature_return_type_location: Option<CodeLocation>,
    pub suppressed_issues: Vec<String>,
    pub variadic: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_private: bool,
    /// Set during inheritance linking when any subclass re-declares this
    /// method.
    pub overridden_somewhere: bool,
    pub owning_class: Option<String>,
    pub location: Option<CodeLocation>,
}
