//! Loading `stanza.toml` into a [`Config`].
//!
//! The raw config text is hashed into `Config::hash`, so any edit to the
//! file invalidates cached file storages on the next run.

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use stanza_common::{Config, Severity};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    project: RawProject,
    /// Issue name → "error" | "info" | "suppress".
    #[serde(default)]
    issues: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    fix: RawFix,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    #[serde(default)]
    paths: Vec<PathBuf>,
    #[serde(default)]
    ignore: Vec<String>,
    cache_dir: Option<PathBuf>,
    #[serde(default)]
    stub_files: Vec<PathBuf>,
    #[serde(default)]
    terminal_functions: Vec<String>,
    #[serde(default)]
    predefined_functions: Vec<String>,
    allow_backwards_incompatible_changes: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFix {
    #[serde(default)]
    issues: Vec<String>,
}

/// The loaded configuration plus the project-level settings that stay in
/// the CLI (search paths, ignore globs).
pub struct LoadedConfig {
    pub config: Config,
    pub paths: Vec<PathBuf>,
    pub ignore: Vec<String>,
}

pub fn load(path: &Path) -> Result<LoadedConfig> {
    if !path.exists() {
        return Ok(LoadedConfig {
            config: Config::default(),
            paths: Vec::new(),
            ignore: Vec::new(),
        });
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let raw: RawConfig = toml::from_str(&text)
        .with_context(|| format!("could not parse {}", path.display()))?;

    let mut config = Config::default();

    for (issue_name, level) in &raw.issues {
        let severity = match level.as_str() {
            "error" => Severity::Error,
            "info" => Severity::Info,
            "suppress" => Severity::Suppress,
            other => anyhow::bail!("unknown severity '{other}' for issue {issue_name}"),
        };
        config.set_issue_level(issue_name, severity);
    }

    config.issues_to_fix = raw.fix.issues.into_iter().collect();
    config.cache_dir = raw.project.cache_dir;
    config.stub_files = raw.project.stub_files;
    for name in raw.project.terminal_functions {
        config.terminal_functions.insert(name.to_lowercase());
    }
    for name in raw.project.predefined_functions {
        config.predefined_functions.insert(name.to_lowercase());
    }
    if let Some(allow) = raw.project.allow_backwards_incompatible_changes {
        config.allow_backwards_incompatible_changes = allow;
    }

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    config.hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config,
        paths: raw.project.paths,
        ignore: raw.project.ignore,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let loaded = load(Path::new("/definitely/not/there/stanza.toml")).unwrap();
        assert!(loaded.config.hash.is_empty());
        assert!(loaded.paths.is_empty());
    }

    #[test]
    fn parses_levels_fixes_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stanza.toml");
        std::fs::write(
            &path,
            r#"
            [project]
            paths = ["src"]
            ignore = ["vendor/**"]

            [issues]
            MissingReturnType = "info"
            LessSpecificReturnType = "suppress"

            [fix]
            issues = ["MissingClosureReturnType"]
            "#,
        )
        .unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(
            loaded.config.issue_level("MissingReturnType"),
            Severity::Info
        );
        assert_eq!(
            loaded.config.issue_level("LessSpecificReturnType"),
            Severity::Suppress
        );
        assert!(loaded.config.fixing("MissingClosureReturnType"));
        assert_eq!(loaded.paths, vec![PathBuf::from("src")]);
        assert_eq!(loaded.ignore, vec!["vendor/**"]);
        assert!(!loaded.config.hash.is_empty());
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stanza.toml");
        std::fs::write(&path, "[issues]\nInvalidReturnType = \"loud\"\n").unwrap();
        assert!(load(&path).is_err());
    }
}
