//! Union types: ordered disjunctions of atomic parts.

use crate::atomic::{Atomic, AtomicKind};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A disjunctive set of possible types for one expression or slot.
///
/// Parts keep insertion order. Predicates and substitution are pure;
/// combination lives in [`crate::combine_types`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    pub parts: SmallVec<[Atomic; 2]>,
    /// The whole annotation came from a docblock rather than a native
    /// signature.
    pub from_docblock: bool,
    /// Null parts in this union stem from constructs the collector already
    /// vouched for; nullability leakage is not reported against it.
    pub ignore_nullable_issues: bool,
    /// Same, for `false` parts.
    pub ignore_falsable_issues: bool,
}

impl Union {
    pub fn new(parts: impl IntoIterator<Item = Atomic>) -> Self {
        Self {
            parts: parts.into_iter().collect(),
            from_docblock: false,
            ignore_nullable_issues: false,
            ignore_falsable_issues: false,
        }
    }

    pub fn of(kind: AtomicKind) -> Self {
        Self::new([Atomic::new(kind)])
    }

    pub fn void() -> Self {
        Self::of(AtomicKind::Void)
    }

    pub fn mixed() -> Self {
        Self::of(AtomicKind::Mixed)
    }

    pub fn string() -> Self {
        Self::of(AtomicKind::String_)
    }

    pub fn nullable(kind: AtomicKind) -> Self {
        Self::new([Atomic::new(kind), Atomic::new(AtomicKind::Null)])
    }

    pub fn as_docblock(mut self) -> Self {
        self.from_docblock = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn is_void(&self) -> bool {
        self.parts.len() == 1 && self.parts[0].kind == AtomicKind::Void
    }

    pub fn is_never(&self) -> bool {
        self.parts.len() == 1 && self.parts[0].kind == AtomicKind::Never
    }

    pub fn is_null(&self) -> bool {
        self.parts.len() == 1 && self.parts[0].kind == AtomicKind::Null
    }

    pub fn is_mixed(&self) -> bool {
        self.parts.len() == 1 && self.parts[0].kind == AtomicKind::Mixed
    }

    pub fn has_mixed(&self) -> bool {
        self.has(&AtomicKind::Mixed)
    }

    pub fn is_nullable(&self) -> bool {
        self.has(&AtomicKind::Null)
    }

    pub fn is_falsable(&self) -> bool {
        self.has(&AtomicKind::False)
    }

    pub fn has_bool(&self) -> bool {
        self.has(&AtomicKind::Bool) || self.has(&AtomicKind::True) || self.has(&AtomicKind::False)
    }

    pub fn has_scalar(&self) -> bool {
        self.has(&AtomicKind::Scalar)
    }

    pub fn has(&self, kind: &AtomicKind) -> bool {
        self.parts.iter().any(|p| &p.kind == kind)
    }

    /// Substitute `self`/`static`/`parent` placeholders with the concrete
    /// owning-class name chain. Placeholders without a binding are left
    /// untouched.
    pub fn substitute_class_context(
        &self,
        self_class: Option<&str>,
        calling_class: Option<&str>,
        parent_class: Option<&str>,
    ) -> Union {
        let mut fleshed = self.clone();
        for part in &mut fleshed.parts {
            if let AtomicKind::NamedObject(name) = &part.kind {
                let replacement = match name.to_lowercase().as_str() {
                    "self" => self_class,
                    "static" => calling_class.or(self_class),
                    "parent" => parent_class,
                    _ => None,
                };
                if let Some(concrete) = replacement {
                    part.kind = AtomicKind::NamedObject(concrete.to_string());
                }
            }
        }
        fleshed
    }

    /// Canonical textual id, e.g. `int|null`.
    pub fn id(&self) -> String {
        format!("{self}")
    }
}

impl std::fmt::Display for Union {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.parts.is_empty() {
            return f.write_str("empty");
        }

        // Two-part nullable unions render in `?T` shorthand.
        if self.parts.len() == 2 && self.is_nullable() {
            if let Some(other) = self.parts.iter().find(|p| p.kind != AtomicKind::Null) {
                if other.kind != AtomicKind::Void && other.kind != AtomicKind::Mixed {
                    return write!(f, "?{other}");
                }
            }
        }

        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_union_renders_shorthand() {
        let ty = Union::nullable(AtomicKind::Int);
        assert_eq!(ty.to_string(), "?int");
        assert!(ty.is_nullable());
        assert!(!ty.is_null());
    }

    #[test]
    fn multi_part_union_renders_pipe_joined() {
        let ty = Union::new([
            Atomic::new(AtomicKind::Int),
            Atomic::new(AtomicKind::String_),
        ]);
        assert_eq!(ty.to_string(), "int|string");
    }

    #[test]
    fn substitute_replaces_self_and_parent() {
        let ty = Union::new([Atomic::named_object("self"), Atomic::named_object("parent")]);
        let fleshed = ty.substitute_class_context(Some("Child"), Some("Child"), Some("Base"));
        assert_eq!(fleshed.to_string(), "Child|Base");
        // Pure: the original is untouched.
        assert_eq!(ty.to_string(), "self|parent");
    }

    #[test]
    fn substitute_keeps_unbound_parent() {
        let ty = Union::new([Atomic::named_object("parent")]);
        let fleshed = ty.substitute_class_context(Some("Root"), None, None);
        assert_eq!(fleshed.to_string(), "parent");
    }
}
