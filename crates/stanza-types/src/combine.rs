//! Combination of atomic parts into one union.

use crate::atomic::{Atomic, AtomicKind};
use crate::union::Union;

/// Merge a list of atomic parts into a single union.
///
/// An empty list combines to `void`. `mixed` absorbs everything; `bool`
/// absorbs `true`/`false` (and `true` + `false` collapse to `bool`);
/// `scalar` absorbs its subtypes. A `void` part combined with anything else
/// degrades to `null` — a union cannot express "no value" alongside values.
pub fn combine_types(parts: impl IntoIterator<Item = Atomic>) -> Union {
    let parts: Vec<Atomic> = parts.into_iter().collect();

    if parts.is_empty() {
        return Union::void();
    }

    if let Some(mixed) = parts.iter().find(|p| p.kind == AtomicKind::Mixed) {
        return Union::new([mixed.clone()]);
    }

    let multiple = parts.len() > 1;
    let has_bool = parts.iter().any(|p| p.kind == AtomicKind::Bool);
    let has_true = parts.iter().any(|p| p.kind == AtomicKind::True);
    let has_false = parts.iter().any(|p| p.kind == AtomicKind::False);
    let has_scalar = parts.iter().any(|p| p.kind == AtomicKind::Scalar);
    let collapse_bool = has_bool || (has_true && has_false);

    let mut combined: Vec<Atomic> = Vec::with_capacity(parts.len());
    let mut seen: Vec<String> = Vec::with_capacity(parts.len());
    let mut push = |part: Atomic, combined: &mut Vec<Atomic>| {
        let id = part.kind.id();
        if !seen.contains(&id) {
            seen.push(id);
            combined.push(part);
        }
    };

    for mut part in parts {
        match part.kind {
            AtomicKind::Void if multiple => {
                part.kind = AtomicKind::Null;
                push(part, &mut combined);
            }
            AtomicKind::True | AtomicKind::False if collapse_bool => {
                part.kind = AtomicKind::Bool;
                push(part, &mut combined);
            }
            AtomicKind::Bool | AtomicKind::Int | AtomicKind::Float | AtomicKind::String_
                if has_scalar =>
            {
                // absorbed
            }
            _ => push(part, &mut combined),
        }
    }

    let from_docblock = combined.iter().all(|p| p.from_docblock);
    let mut union = Union::new(combined);
    union.from_docblock = from_docblock;
    union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_combines_to_void() {
        assert!(combine_types([]).is_void());
    }

    #[test]
    fn duplicate_parts_dedupe() {
        let ty = combine_types([
            Atomic::new(AtomicKind::Int),
            Atomic::new(AtomicKind::Int),
            Atomic::new(AtomicKind::Null),
        ]);
        assert_eq!(ty.to_string(), "?int");
    }

    #[test]
    fn mixed_absorbs_everything() {
        let ty = combine_types([
            Atomic::new(AtomicKind::Int),
            Atomic::new(AtomicKind::Mixed),
            Atomic::new(AtomicKind::Null),
        ]);
        assert!(ty.is_mixed());
    }

    #[test]
    fn true_and_false_collapse_to_bool() {
        let ty = combine_types([Atomic::new(AtomicKind::True), Atomic::new(AtomicKind::False)]);
        assert_eq!(ty.to_string(), "bool");
    }

    #[test]
    fn void_degrades_to_null_when_combined() {
        let ty = combine_types([Atomic::new(AtomicKind::Int), Atomic::new(AtomicKind::Void)]);
        assert_eq!(ty.to_string(), "?int");
    }

    #[test]
    fn named_objects_dedupe_case_insensitively() {
        let ty = combine_types([Atomic::named_object("Foo\\Bar"), Atomic::named_object("foo\\bar")]);
        assert_eq!(ty.parts.len(), 1);
    }
}
