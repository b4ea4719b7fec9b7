//! Common types and utilities for the stanza PHP type checker.
//!
//! This crate provides foundational types used across all stanza crates:
//! - Source spans and code locations (`Span`, `CodeLocation`)
//! - The issue taxonomy and the accept-issue gate (`Issue`, `IssueBuffer`)
//! - Project configuration (`Config`, issue levels, fix sets)

// Span - source location tracking (byte offsets)
pub mod span;
pub use span::{CodeLocation, Span};

// Issue taxonomy and the single reporting gate
pub mod issues;
pub use issues::{Issue, IssueBuffer, IssueKind, Severity};

// Project configuration
pub mod config;
pub use config::Config;
