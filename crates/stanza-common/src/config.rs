//! Project configuration.
//!
//! Loaded from `stanza.toml` by the CLI; library consumers construct it
//! directly. The `hash` field participates in the cache dependency
//! fingerprint, so any change to the configuration invalidates cached file
//! storages.

use crate::issues::Severity;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Per-issue severity overrides, keyed by issue name.
    issue_levels: FxHashMap<String, Severity>,

    /// Issue names the auto-fix pass is allowed to resolve by rewriting
    /// signatures.
    pub issues_to_fix: FxHashSet<String>,

    /// Whether declared native return types may be rewritten even when the
    /// function is neither final nor private.
    pub allow_backwards_incompatible_changes: bool,

    /// Whether `@return void` docblocks are added to functions that return
    /// nothing.
    pub add_void_docblocks: bool,

    /// When a docblock-inferred type is available, restrict native-signature
    /// rewrites to docblock edits only.
    pub only_replace_php_types_with_non_docblock_types: bool,

    /// Call names treated as terminating the process (`exit`, `die`, ...).
    pub terminal_functions: FxHashSet<String>,

    /// Function names resolvable through host reflection without a
    /// declaration in the scanned files.
    pub predefined_functions: FxHashSet<String>,

    /// Root directory for the file-storage cache; `None` disables caching.
    pub cache_dir: Option<PathBuf>,

    /// Stub/plugin files whose modification times join the cache dependency
    /// fingerprint.
    pub stub_files: Vec<PathBuf>,

    /// Hash of the effective configuration, stamped by the loader.
    pub hash: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut terminal_functions = FxHashSet::default();
        terminal_functions.insert("exit".to_string());
        terminal_functions.insert("die".to_string());

        Self {
            issue_levels: FxHashMap::default(),
            issues_to_fix: FxHashSet::default(),
            allow_backwards_incompatible_changes: true,
            add_void_docblocks: true,
            only_replace_php_types_with_non_docblock_types: false,
            terminal_functions,
            predefined_functions: FxHashSet::default(),
            cache_dir: None,
            stub_files: Vec::new(),
            hash: String::new(),
        }
    }
}

impl Config {
    pub fn issue_level(&self, issue_name: &str) -> Severity {
        self.issue_levels
            .get(issue_name)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_issue_level(&mut self, issue_name: impl Into<String>, level: Severity) {
        self.issue_levels.insert(issue_name.into(), level);
    }

    pub fn fixing(&self, issue_name: &str) -> bool {
        self.issues_to_fix.contains(issue_name)
    }

    pub fn is_terminal_function(&self, name: &str) -> bool {
        self.terminal_functions.contains(&name.to_lowercase())
    }
}
