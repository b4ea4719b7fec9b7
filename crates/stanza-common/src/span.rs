//! Byte-offset source spans and file-qualified code locations.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into one source file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// A span tied to the file it came from. Issues and declared-type
/// locations carry one of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    pub file_path: String,
    pub span: Span,
}

impl CodeLocation {
    pub fn new(file_path: impl Into<String>, span: Span) -> Self {
        Self {
            file_path: file_path.into(),
            span,
        }
    }

    /// 1-based line number of the span start, given the file contents.
    pub fn line_in(&self, contents: &str) -> u32 {
        let start = (self.span.start as usize).min(contents.len());
        contents[..start].bytes().filter(|&b| b == b'\n').count() as u32 + 1
    }
}
