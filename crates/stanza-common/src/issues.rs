//! The issue taxonomy and the accept-issue gate.
//!
//! Every violation the checker can report funnels through
//! [`IssueBuffer::accepts`]: it applies scope suppressions and configured
//! severities, records the issue, and tells the caller whether the issue is
//! fatal for the current function's analysis. Internal-consistency and
//! infrastructure errors never pass through here.

use crate::config::Config;
use crate::span::CodeLocation;
use serde::{Deserialize, Serialize};

/// Kinds of user-facing analysis issues.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    InvalidReturnType,
    MissingReturnType,
    MissingClosureReturnType,
    InvalidNullableReturnType,
    InvalidFalsableReturnType,
    LessSpecificReturnType,
    MoreSpecificReturnType,
    MixedReturnTypeCoercion,
    MixedInferredReturnType,
    InvalidToString,
    MismatchingDocblockReturnType,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::InvalidReturnType => "InvalidReturnType",
            IssueKind::MissingReturnType => "MissingReturnType",
            IssueKind::MissingClosureReturnType => "MissingClosureReturnType",
            IssueKind::InvalidNullableReturnType => "InvalidNullableReturnType",
            IssueKind::InvalidFalsableReturnType => "InvalidFalsableReturnType",
            IssueKind::LessSpecificReturnType => "LessSpecificReturnType",
            IssueKind::MoreSpecificReturnType => "MoreSpecificReturnType",
            IssueKind::MixedReturnTypeCoercion => "MixedReturnTypeCoercion",
            IssueKind::MixedInferredReturnType => "MixedInferredReturnType",
            IssueKind::InvalidToString => "InvalidToString",
            IssueKind::MismatchingDocblockReturnType => "MismatchingDocblockReturnType",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting level for an issue kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Suppress,
    Info,
    #[default]
    Error,
}

/// A recorded analysis issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub location: CodeLocation,
    pub severity: Severity,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>, location: CodeLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            severity: Severity::Error,
        }
    }
}

/// Collects issues for one analysis pass.
///
/// Lifetime-scoped rather than global: each worker owns its buffer and the
/// coordinator merges them afterwards.
#[derive(Debug, Default)]
pub struct IssueBuffer {
    issues: Vec<Issue>,
}

impl IssueBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single gate all violations pass through.
    ///
    /// Returns `true` when the issue was recorded at error level, which
    /// callers treat as fatal for the current function's analysis. Suppressed
    /// issues are dropped and never fatal.
    pub fn accepts(&mut self, mut issue: Issue, config: &Config, suppressed: &[String]) -> bool {
        let name = issue.kind.as_str();

        if suppressed.iter().any(|s| s == name) {
            tracing::trace!(issue = name, "suppressed in scope");
            return false;
        }

        match config.issue_level(name) {
            Severity::Suppress => false,
            Severity::Info => {
                issue.severity = Severity::Info;
                self.issues.push(issue);
                false
            }
            Severity::Error => {
                issue.severity = Severity::Error;
                self.issues.push(issue);
                true
            }
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Fold another buffer's issues into this one.
    pub fn extend(&mut self, other: IssueBuffer) {
        self.issues.extend(other.issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn loc() -> CodeLocation {
        CodeLocation::new("a.php", Span::new(0, 1))
    }

    #[test]
    fn error_level_issue_is_fatal() {
        let config = Config::default();
        let mut buffer = IssueBuffer::new();
        let fatal = buffer.accepts(
            Issue::new(IssueKind::InvalidReturnType, "bad", loc()),
            &config,
            &[],
        );
        assert!(fatal);
        assert_eq!(buffer.issues().len(), 1);
    }

    #[test]
    fn scope_suppression_drops_issue() {
        let config = Config::default();
        let mut buffer = IssueBuffer::new();
        let fatal = buffer.accepts(
            Issue::new(IssueKind::InvalidReturnType, "bad", loc()),
            &config,
            &["InvalidReturnType".to_string()],
        );
        assert!(!fatal);
        assert!(buffer.is_empty());
    }

    #[test]
    fn configured_info_level_records_without_fatal() {
        let mut config = Config::default();
        config.set_issue_level("MissingReturnType", Severity::Info);
        let mut buffer = IssueBuffer::new();
        let fatal = buffer.accepts(
            Issue::new(IssueKind::MissingReturnType, "missing", loc()),
            &config,
            &[],
        );
        assert!(!fatal);
        assert_eq!(buffer.issues()[0].severity, Severity::Info);
    }
}
