//! Scanner and recursive-descent parser for the PHP subset stanza analyzes.
//!
//! The rest of the workspace consumes exactly one entry point:
//! [`parse_file`], which turns a path + contents pair into a [`FileAst`].

pub mod ast;
pub mod docblock;
mod scanner;
mod parser;
mod type_string;

pub use ast::*;
pub use docblock::Docblock;
pub use type_string::parse_type_string;

use stanza_common::Span;

/// A syntax error with the byte span it was detected at.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at {}..{}: {message}", span.start, span.end)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Parse one source file into its AST.
pub fn parse_file(path: &str, contents: &str) -> Result<FileAst, ParseError> {
    let _span = tracing::debug_span!("parse_file", path).entered();
    let tokens = scanner::scan(contents)?;
    parser::Parser::new(path, tokens).parse()
}
