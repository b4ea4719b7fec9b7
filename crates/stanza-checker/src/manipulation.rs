//! Pending signature-edit buffer for auto-fixes.
//!
//! Auto-fix branches of the verification engine never raise; they queue an
//! edit here and return early. The CLI (or any other consumer) decides
//! whether and how to apply the queued edits to source text.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use stanza_common::Span;
use stanza_types::{AtomicKind, Union};

/// One queued return-type rewrite, keyed by file + function span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureEdit {
    pub file_path: String,
    pub function_span: Span,
    pub cased_id: String,
    /// Rendered native signature type, when the policy allows touching the
    /// native signature. `None` means docblock-only.
    pub native_type: Option<String>,
    /// Rendered docblock type; always present.
    pub docblock_type: String,
}

#[derive(Debug, Default)]
pub struct ManipulationBuffer {
    edits: FxHashMap<(String, u32), SignatureEdit>,
}

impl ManipulationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue (or replace) the return-type edit for one function.
    pub fn set_return_type(&mut self, edit: SignatureEdit) {
        self.edits
            .insert((edit.file_path.clone(), edit.function_span.start), edit);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn into_edits(self) -> Vec<SignatureEdit> {
        let mut edits: Vec<SignatureEdit> = self.edits.into_values().collect();
        edits.sort_by(|a, b| {
            (&a.file_path, a.function_span.start).cmp(&(&b.file_path, b.function_span.start))
        });
        edits
    }
}

/// Whether a union can be written as a native signature type (at most one
/// non-null part, and nothing docblock-only like `false` or `scalar`).
pub fn can_express_natively(ty: &Union) -> bool {
    let non_null: Vec<_> = ty
        .parts
        .iter()
        .filter(|part| part.kind != AtomicKind::Null)
        .collect();

    if non_null.len() != 1 {
        return false;
    }

    !matches!(
        non_null[0].kind,
        AtomicKind::False | AtomicKind::True | AtomicKind::Scalar | AtomicKind::Never
    )
}

/// Render a union the way a native signature writes it.
pub fn render_native(ty: &Union) -> String {
    ty.to_string()
}
