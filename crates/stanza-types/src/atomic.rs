//! Atomic type parts.

use serde::{Deserialize, Serialize};

/// The kind of one atomic type part.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomicKind {
    Int,
    Float,
    String_,
    Bool,
    True,
    False,
    Null,
    Void,
    Never,
    Mixed,
    Scalar,
    /// A class, interface or trait instance, by fully-qualified name.
    NamedObject(String),
    /// An anonymous function value.
    Closure,
}

impl AtomicKind {
    /// Key used for deduplication during combination. Named objects key by
    /// lower-cased name (class names compare case-insensitively).
    pub fn id(&self) -> String {
        match self {
            AtomicKind::NamedObject(name) => name.to_lowercase(),
            other => other.keyword().to_string(),
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            AtomicKind::Int => "int",
            AtomicKind::Float => "float",
            AtomicKind::String_ => "string",
            AtomicKind::Bool => "bool",
            AtomicKind::True => "true",
            AtomicKind::False => "false",
            AtomicKind::Null => "null",
            AtomicKind::Void => "void",
            AtomicKind::Never => "never",
            AtomicKind::Mixed => "mixed",
            AtomicKind::Scalar => "scalar",
            AtomicKind::NamedObject(name) => name,
            AtomicKind::Closure => "Closure",
        }
    }

    pub fn is_scalar_subtype(&self) -> bool {
        matches!(
            self,
            AtomicKind::Int
                | AtomicKind::Float
                | AtomicKind::String_
                | AtomicKind::Bool
                | AtomicKind::True
                | AtomicKind::False
        )
    }
}

/// One disjunct of a union type.
///
/// `from_docblock` marks the part as docblock-sourced (soft): it came from a
/// structured comment or was injected by inference rather than a native
/// signature, and is treated as lower-confidence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atomic {
    pub kind: AtomicKind,
    pub from_docblock: bool,
}

impl Atomic {
    pub fn new(kind: AtomicKind) -> Self {
        Self {
            kind,
            from_docblock: false,
        }
    }

    pub fn docblock(kind: AtomicKind) -> Self {
        Self {
            kind,
            from_docblock: true,
        }
    }

    pub fn named_object(name: impl Into<String>) -> Self {
        Self::new(AtomicKind::NamedObject(name.into()))
    }
}

impl std::fmt::Display for Atomic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind.keyword())
    }
}
