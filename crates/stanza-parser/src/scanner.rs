//! Hand-written scanner producing the token stream the parser consumes.

use crate::ParseError;
use stanza_common::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Variable(String),
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    DocComment(String),

    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Semicolon,
    Comma,
    Colon,
    DoubleColon,
    Question,
    Arrow,
    Pipe,
    Amp,
    AmpAmp,
    PipePipe,
    Bang,
    Assign,
    EqEq,
    EqEqEq,
    BangEq,
    BangEqEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Dot,
    Ellipsis,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

/// Scan a whole source file. A leading `<?php` open tag is skipped.
pub fn scan(contents: &str) -> Result<Vec<Token>, ParseError> {
    let mut scanner = Scanner {
        bytes: contents.as_bytes(),
        pos: 0,
    };

    if contents.starts_with("<?php") {
        scanner.pos = 5;
    }

    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn bump(&mut self) -> u8 {
        let byte = self.peek();
        self.pos += 1;
        byte
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        loop {
            self.skip_whitespace();

            // Comments. Doc comments become tokens; others are skipped.
            if self.peek() == b'/' && self.peek_at(1) == b'/' {
                self.skip_line();
                continue;
            }
            if self.peek() == b'#' {
                self.skip_line();
                continue;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                let is_doc = self.peek_at(2) == b'*' && self.peek_at(3) != b'/';
                self.pos += 2;
                while self.pos < self.bytes.len()
                    && !(self.peek() == b'*' && self.peek_at(1) == b'/')
                {
                    self.pos += 1;
                }
                if self.pos >= self.bytes.len() {
                    return Err(ParseError::new(
                        "unterminated block comment",
                        self.span_from(start),
                    ));
                }
                self.pos += 2;
                if is_doc {
                    let text =
                        String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                    return Ok(Token {
                        kind: TokenKind::DocComment(text),
                        span: self.span_from(start),
                    });
                }
                continue;
            }

            break;
        }

        let start = self.pos;
        if self.pos >= self.bytes.len() {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: self.span_from(start),
            });
        }

        let byte = self.peek();

        if byte == b'$' {
            self.pos += 1;
            let name = self.take_ident_tail();
            if name.is_empty() {
                return Err(ParseError::new("expected variable name after '$'", self.span_from(start)));
            }
            return Ok(Token {
                kind: TokenKind::Variable(name),
                span: self.span_from(start),
            });
        }

        if byte.is_ascii_alphabetic() || byte == b'_' || byte == b'\\' {
            let mut name = String::new();
            loop {
                let b = self.peek();
                if !(b.is_ascii_alphanumeric() || b == b'_' || b == b'\\') {
                    break;
                }
                name.push(self.bump() as char);
            }
            return Ok(Token {
                kind: TokenKind::Ident(name),
                span: self.span_from(start),
            });
        }

        if byte.is_ascii_digit() {
            return self.scan_number(start);
        }

        if byte == b'\'' || byte == b'"' {
            return self.scan_string(start, byte);
        }

        self.pos += 1;
        let kind = match byte {
            b'(' => TokenKind::OpenParen,
            b')' => TokenKind::CloseParen,
            b'{' => TokenKind::OpenBrace,
            b'}' => TokenKind::CloseBrace,
            b';' => TokenKind::Semicolon,
            b',' => TokenKind::Comma,
            b'?' => TokenKind::Question,
            b':' => {
                if self.peek() == b':' {
                    self.pos += 1;
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            b'-' => {
                if self.peek() == b'>' {
                    self.pos += 1;
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            b'|' => {
                if self.peek() == b'|' {
                    self.pos += 1;
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            b'&' => {
                if self.peek() == b'&' {
                    self.pos += 1;
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Amp
                }
            }
            b'!' => {
                if self.peek() == b'=' {
                    self.pos += 1;
                    if self.peek() == b'=' {
                        self.pos += 1;
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            b'=' => {
                if self.peek() == b'=' {
                    self.pos += 1;
                    if self.peek() == b'=' {
                        self.pos += 1;
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Assign
                }
            }
            b'<' => {
                if self.peek() == b'=' {
                    self.pos += 1;
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if self.peek() == b'=' {
                    self.pos += 1;
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            b'+' => TokenKind::Plus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'.' => {
                if self.peek() == b'.' && self.peek_at(1) == b'.' {
                    self.pos += 2;
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            other => {
                return Err(ParseError::new(
                    format!("unexpected character '{}'", other as char),
                    self.span_from(start),
                ));
            }
        };

        Ok(Token {
            kind,
            span: self.span_from(start),
        })
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn skip_line(&mut self) {
        while self.pos < self.bytes.len() && self.peek() != b'\n' {
            self.pos += 1;
        }
    }

    fn take_ident_tail(&mut self) -> String {
        let mut name = String::new();
        loop {
            let b = self.peek();
            if !(b.is_ascii_alphanumeric() || b == b'_') {
                break;
            }
            name.push(self.bump() as char);
        }
        name
    }

    fn scan_number(&mut self, start: usize) -> Result<Token, ParseError> {
        let mut text = String::new();
        while self.peek().is_ascii_digit() {
            text.push(self.bump() as char);
        }
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            text.push(self.bump() as char);
            while self.peek().is_ascii_digit() {
                text.push(self.bump() as char);
            }
            let value: f64 = text
                .parse()
                .map_err(|_| ParseError::new("invalid float literal", self.span_from(start)))?;
            return Ok(Token {
                kind: TokenKind::FloatLit(value),
                span: self.span_from(start),
            });
        }
        let value: i64 = text
            .parse()
            .map_err(|_| ParseError::new("invalid int literal", self.span_from(start)))?;
        Ok(Token {
            kind: TokenKind::IntLit(value),
            span: self.span_from(start),
        })
    }

    fn scan_string(&mut self, start: usize, quote: u8) -> Result<Token, ParseError> {
        self.pos += 1;
        let mut value = String::new();
        while self.pos < self.bytes.len() && self.peek() != quote {
            let b = self.bump();
            if b == b'\\' && self.pos < self.bytes.len() {
                let escaped = self.bump();
                match escaped {
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    other => value.push(other as char),
                }
            } else {
                value.push(b as char);
            }
        }
        if self.pos >= self.bytes.len() {
            return Err(ParseError::new(
                "unterminated string literal",
                self.span_from(start),
            ));
        }
        self.pos += 1;
        Ok(Token {
            kind: TokenKind::StringLit(value),
            span: self.span_from(start),
        })
    }
}
