//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stanza", about = "A static type checker for PHP", version)]
pub struct Args {
    /// Files or directories to check. Defaults to the config's paths.
    pub paths: Vec<PathBuf>,

    /// Path to stanza.toml.
    #[arg(long, default_value = "stanza.toml")]
    pub config: PathBuf,

    /// Number of worker threads (defaults to the number of CPUs).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Disable the file-storage cache for this run.
    #[arg(long)]
    pub no_cache: bool,

    /// Override the cache directory.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Issue names to auto-fix instead of reporting (repeatable).
    #[arg(long = "fix", value_name = "ISSUE")]
    pub fix: Vec<String>,

    /// Verbose logging (also honors STANZA_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}
