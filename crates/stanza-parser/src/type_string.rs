//! Parsing of type annotations (`?int`, `A|B`, class names) into unions.

use stanza_types::{Atomic, AtomicKind, Union};

/// Parse a type annotation string into a union.
///
/// `from_docblock` marks every produced part (and the union) as
/// docblock-sourced. Unknown names become named-object parts; a leading
/// namespace separator is stripped. Returns `None` for an empty string.
pub fn parse_type_string(text: &str, from_docblock: bool) -> Option<Union> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut parts = Vec::new();

    let (nullable, text) = match text.strip_prefix('?') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    for chunk in text.split('|') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        parts.push(Atomic {
            kind: keyword_to_kind(chunk),
            from_docblock,
        });
    }

    if parts.is_empty() {
        return None;
    }

    if nullable && !parts.iter().any(|p| p.kind == AtomicKind::Null) {
        parts.push(Atomic {
            kind: AtomicKind::Null,
            from_docblock,
        });
    }

    let mut union = Union::new(parts);
    union.from_docblock = from_docblock;
    Some(union)
}

fn keyword_to_kind(name: &str) -> AtomicKind {
    match name.to_lowercase().as_str() {
        "int" | "integer" => AtomicKind::Int,
        "float" | "double" => AtomicKind::Float,
        "string" => AtomicKind::String_,
        "bool" | "boolean" => AtomicKind::Bool,
        "true" => AtomicKind::True,
        "false" => AtomicKind::False,
        "null" => AtomicKind::Null,
        "void" => AtomicKind::Void,
        "never" | "no-return" => AtomicKind::Never,
        "mixed" => AtomicKind::Mixed,
        "scalar" => AtomicKind::Scalar,
        "callable" | "closure" => AtomicKind::Closure,
        _ => AtomicKind::NamedObject(name.trim_start_matches('\\').to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nullable_shorthand() {
        let ty = parse_type_string("?int", false).unwrap();
        assert_eq!(ty.to_string(), "?int");
        assert!(!ty.from_docblock);
    }

    #[test]
    fn parses_union_with_docblock_flag() {
        let ty = parse_type_string("int|false", true).unwrap();
        assert!(ty.from_docblock);
        assert!(ty.is_falsable());
    }

    #[test]
    fn strips_leading_namespace_separator() {
        let ty = parse_type_string("\\Foo\\Bar", false).unwrap();
        assert_eq!(ty.to_string(), "Foo\\Bar");
    }

    #[test]
    fn empty_is_none() {
        assert!(parse_type_string("  ", false).is_none());
    }
}
