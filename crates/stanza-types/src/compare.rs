//! Union containment with coercion detection.

use crate::atomic::{Atomic, AtomicKind};
use crate::union::Union;
use crate::HierarchyResolver;

/// Outcome of a containment query.
///
/// `type_coerced` means containment failed but every failing input part is
/// *wider* than some container part — the declared side is more specific
/// than the inferred side. `type_coerced_from_mixed` narrows that to the
/// case where the widening came from a `mixed` escape hatch.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeComparison {
    pub contained: bool,
    pub has_scalar_match: bool,
    pub type_coerced: bool,
    pub type_coerced_from_mixed: bool,
}

/// Whether every part of `input` is contained by some part of `container`.
///
/// `ignore_null` / `ignore_false` drop the respective input parts before the
/// check, mirroring the caller-side "leakage is handled separately" policy.
pub fn union_contained_by(
    input: &Union,
    container: &Union,
    ignore_null: bool,
    ignore_false: bool,
    hierarchy: &dyn HierarchyResolver,
) -> TypeComparison {
    let mut result = TypeComparison {
        contained: true,
        ..TypeComparison::default()
    };

    let mut all_failures_coerced = true;
    let mut any_failure = false;
    let mut any_failure_from_mixed = false;

    for input_part in &input.parts {
        if ignore_null && input_part.kind == AtomicKind::Null {
            continue;
        }
        if ignore_false && input_part.kind == AtomicKind::False {
            continue;
        }

        let mut part_contained = false;
        let mut part_coercible = false;

        for container_part in &container.parts {
            if atomic_contained_by(input_part, container_part, hierarchy) {
                part_contained = true;
                if container_part.kind == AtomicKind::Scalar
                    && input_part.kind.is_scalar_subtype()
                {
                    result.has_scalar_match = true;
                }
                break;
            }

            // Reverse containment: the declared part is a strict subtype of
            // what was inferred, so the mismatch is a coercion, not a clash.
            if atomic_contained_by(container_part, input_part, hierarchy) {
                part_coercible = true;
            }
        }

        if !part_contained {
            any_failure = true;
            if part_coercible {
                if input_part.kind == AtomicKind::Mixed {
                    any_failure_from_mixed = true;
                }
            } else {
                all_failures_coerced = false;
            }
        }
    }

    if any_failure {
        result.contained = false;
        result.type_coerced = all_failures_coerced;
        result.type_coerced_from_mixed = all_failures_coerced && any_failure_from_mixed;
    }

    result
}

fn atomic_contained_by(
    input: &Atomic,
    container: &Atomic,
    hierarchy: &dyn HierarchyResolver,
) -> bool {
    use AtomicKind::*;

    match (&input.kind, &container.kind) {
        (_, Mixed) => true,
        (Never, _) => true,
        (a, b) if a == b => true,
        (NamedObject(child), NamedObject(parent)) => {
            child.eq_ignore_ascii_case(parent) || hierarchy.is_descendant_of(child, parent)
        }
        (True | False, Bool) => true,
        (kind, Scalar) => kind.is_scalar_subtype(),
        (Closure, NamedObject(name)) => name.eq_ignore_ascii_case("closure"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoHierarchy;

    fn cmp(input: &Union, container: &Union) -> TypeComparison {
        union_contained_by(input, container, false, false, &NoHierarchy)
    }

    #[test]
    fn int_contained_in_nullable_int() {
        let result = cmp(&Union::of(AtomicKind::Int), &Union::nullable(AtomicKind::Int));
        assert!(result.contained);
    }

    #[test]
    fn nullable_int_not_contained_in_int() {
        let result = cmp(&Union::nullable(AtomicKind::Int), &Union::of(AtomicKind::Int));
        assert!(!result.contained);
        assert!(!result.type_coerced);
    }

    #[test]
    fn wider_inferred_type_is_coercion() {
        // inferred scalar vs declared int: declared is more specific.
        let result = cmp(&Union::of(AtomicKind::Scalar), &Union::of(AtomicKind::Int));
        assert!(!result.contained);
        assert!(result.type_coerced);
        assert!(!result.type_coerced_from_mixed);
    }

    #[test]
    fn mixed_inferred_type_is_mixed_coercion() {
        let result = cmp(&Union::mixed(), &Union::of(AtomicKind::Int));
        assert!(!result.contained);
        assert!(result.type_coerced);
        assert!(result.type_coerced_from_mixed);
    }

    #[test]
    fn int_vs_string_is_plain_mismatch() {
        let result = cmp(&Union::of(AtomicKind::Int), &Union::string());
        assert!(!result.contained);
        assert!(!result.type_coerced);
    }

    #[test]
    fn scalar_match_is_flagged() {
        let result = cmp(&Union::of(AtomicKind::Int), &Union::of(AtomicKind::Scalar));
        assert!(result.contained);
        assert!(result.has_scalar_match);
    }

    #[test]
    fn subclass_contained_via_hierarchy() {
        struct Pair;
        impl HierarchyResolver for Pair {
            fn is_descendant_of(&self, child: &str, parent: &str) -> bool {
                child == "Child" && parent == "Base"
            }
        }
        let result = union_contained_by(
            &Union::new([Atomic::named_object("Child")]),
            &Union::new([Atomic::named_object("Base")]),
            false,
            false,
            &Pair,
        );
        assert!(result.contained);
    }

    #[test]
    fn ignore_null_drops_null_part() {
        let result = union_contained_by(
            &Union::nullable(AtomicKind::Int),
            &Union::of(AtomicKind::Int),
            true,
            false,
            &NoHierarchy,
        );
        assert!(result.contained);
    }
}
