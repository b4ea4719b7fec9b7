//! Structured docblock parsing.
//!
//! Only the tags the checker consumes are modeled: `@return`, `@var`,
//! `@property-read` / `@property-write`, `@suppress`, `@template`.

use crate::type_string::parse_type_string;
use stanza_types::Union;

#[derive(Debug, Clone, Default)]
pub struct Docblock {
    /// `@return T`
    pub return_type: Option<Union>,
    /// `@var T`
    pub var_type: Option<Union>,
    /// `@property-read T $name`
    pub property_read_types: Vec<(String, Union)>,
    /// `@property-write T $name`
    pub property_write_types: Vec<(String, Union)>,
    /// `@suppress IssueName`
    pub suppressed: Vec<String>,
    /// `@template T`
    pub templates: Vec<String>,
}

impl Docblock {
    /// Parse the raw `/** ... */` comment text.
    pub fn parse(raw: &str) -> Self {
        let mut docblock = Docblock::default();

        let inner = raw
            .trim_start_matches("/**")
            .trim_end_matches("*/");

        for line in inner.lines() {
            let line = line.trim().trim_start_matches('*').trim();
            let Some(rest) = line.strip_prefix('@') else {
                continue;
            };

            let (tag, rest) = match rest.split_once(char::is_whitespace) {
                Some((tag, rest)) => (tag, rest.trim()),
                None => (rest, ""),
            };

            match tag {
                "return" => {
                    let type_text = first_word(rest);
                    docblock.return_type = parse_type_string(type_text, true);
                }
                "var" => {
                    let type_text = first_word(rest);
                    docblock.var_type = parse_type_string(type_text, true);
                }
                "property-read" | "property-write" => {
                    if let Some((ty, name)) = split_type_and_var(rest) {
                        if tag == "property-read" {
                            docblock.property_read_types.push((name, ty));
                        } else {
                            docblock.property_write_types.push((name, ty));
                        }
                    }
                }
                "suppress" => {
                    for name in rest.split([',', ' ']) {
                        let name = name.trim();
                        if !name.is_empty() {
                            docblock.suppressed.push(name.to_string());
                        }
                    }
                }
                "template" => {
                    let name = first_word(rest);
                    if !name.is_empty() {
                        docblock.templates.push(name.to_string());
                    }
                }
                _ => {}
            }
        }

        docblock
    }
}

fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

fn split_type_and_var(rest: &str) -> Option<(Union, String)> {
    let mut words = rest.split_whitespace();
    let type_text = words.next()?;
    let var = words.next()?;
    let name = var.strip_prefix('$')?.to_string();
    let ty = parse_type_string(type_text, true)?;
    Some((ty, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_return_tag() {
        let docblock = Docblock::parse("/** @return ?int */");
        assert_eq!(docblock.return_type.unwrap().to_string(), "?int");
    }

    #[test]
    fn parses_multiline_tags() {
        let docblock = Docblock::parse(
            "/**\n * @property-read int $count\n * @suppress InvalidReturnType, MissingReturnType\n */",
        );
        assert_eq!(docblock.property_read_types.len(), 1);
        assert_eq!(docblock.property_read_types[0].0, "count");
        assert_eq!(
            docblock.suppressed,
            vec!["InvalidReturnType", "MissingReturnType"]
        );
    }

    #[test]
    fn ignores_unknown_tags() {
        let docblock = Docblock::parse("/** @param int $x\n * @deprecated */");
        assert!(docblock.return_type.is_none());
        assert!(docblock.suppressed.is_empty());
    }
}
