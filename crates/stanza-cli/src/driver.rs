//! The compilation driver: discovery, scan, parallel analysis, reporting.

use crate::args::Args;
use crate::config_loader;
use anyhow::{Context, Result};
use colored::Colorize;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use stanza_checker::{FileAnalyzer, SignatureEdit};
use stanza_codebase::{Codebase, FileStorageCacheProvider};
use stanza_common::{Issue, Severity};
use stanza_fork::Pool;
use stanza_parser::parse_file;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use walkdir::WalkDir;

/// One file's analysis outcome, as streamed back from a worker.
#[derive(Debug, Serialize, Deserialize)]
struct TaskOutcome {
    file_path: String,
    issues: Vec<Issue>,
    edits: Vec<SignatureEdit>,
    /// Internal-consistency failure; fatal to the run, not an issue.
    internal_error: Option<String>,
}

/// Per-worker aggregate returned through the process-done frame.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkerSummary {
    files_analyzed: usize,
    internal_errors: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub error_count: usize,
    pub info_count: usize,
    pub had_infra_error: bool,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        if self.had_infra_error {
            2
        } else if self.error_count > 0 {
            1
        } else {
            0
        }
    }
}

struct SourceFile {
    path: String,
    contents: String,
}

pub fn run(args: &Args) -> Result<RunSummary> {
    let loaded = config_loader::load(&args.config)?;
    let mut config = loaded.config;

    for issue_name in &args.fix {
        config.issues_to_fix.insert(issue_name.clone());
    }
    if let Some(cache_dir) = &args.cache_dir {
        config.cache_dir = Some(cache_dir.clone());
    }
    if args.no_cache {
        config.cache_dir = None;
    }

    let search_paths = if args.paths.is_empty() {
        if loaded.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            loaded.paths.clone()
        }
    } else {
        args.paths.clone()
    };

    let ignore_set = build_ignore_set(&loaded.ignore)?;
    let sources = discover_sources(&search_paths, &ignore_set)?;
    tracing::info!(files = sources.len(), "discovered source files");

    let mut summary = RunSummary::default();
    let config = Arc::new(config);
    let mut codebase = Codebase::new(Arc::clone(&config));

    // Scan pass, cache-aware: a hit skips re-parsing entirely.
    let cache = FileStorageCacheProvider::for_config(&config)?;
    {
        let _span = tracing::info_span!("scan_files", files = sources.len()).entered();
        for source in &sources {
            if let Some(cache) = &cache {
                if let Some(cached) = cache.get_latest_from_cache(&source.path, &source.contents) {
                    codebase.add_file_storage(cached);
                    continue;
                }
            }

            let ast = match parse_file(&source.path, &source.contents) {
                Ok(ast) => ast,
                Err(error) => {
                    eprintln!("{}: {error}", source.path);
                    summary.had_infra_error = true;
                    continue;
                }
            };
            let mut storage = codebase.scan_file(&ast);
            if let Some(cache) = &cache {
                if let Err(error) = cache.write_to_cache(&mut storage, &source.contents) {
                    tracing::warn!(%error, file = %source.path, "could not write cache entry");
                }
            }
        }
    }
    codebase.link();

    let thread_count = args
        .threads
        .unwrap_or_else(num_cpus::get)
        .clamp(1, sources.len().max(1));

    let (outcomes, pool_had_error) = if thread_count <= 1 {
        (analyze_in_process(&codebase, &sources), false)
    } else {
        analyze_with_pool(codebase, sources.iter(), thread_count)?
    };
    summary.had_infra_error |= pool_had_error;

    report(&sources, outcomes, &mut summary);
    Ok(summary)
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("bad ignore glob '{pattern}'"))?);
    }
    Ok(builder.build()?)
}

fn discover_sources(paths: &[PathBuf], ignore: &GlobSet) -> Result<Vec<SourceFile>> {
    let mut sources = Vec::new();

    for root in paths {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("php") {
                continue;
            }
            if ignore.is_match(path) {
                continue;
            }
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            sources.push(SourceFile {
                path: path.to_string_lossy().into_owned(),
                contents,
            });
        }
    }

    Ok(sources)
}

fn analyze_one(codebase: &Codebase, path: &str, contents: &str) -> TaskOutcome {
    let ast = match parse_file(path, contents) {
        Ok(ast) => ast,
        Err(error) => {
            return TaskOutcome {
                file_path: path.to_string(),
                issues: Vec::new(),
                edits: Vec::new(),
                internal_error: Some(format!("parse failure: {error}")),
            };
        }
    };

    match FileAnalyzer::new(codebase).analyze(&ast) {
        Ok(result) => TaskOutcome {
            file_path: result.file_path,
            issues: result.issues,
            edits: result.edits,
            internal_error: None,
        },
        Err(error) => TaskOutcome {
            file_path: path.to_string(),
            issues: Vec::new(),
            edits: Vec::new(),
            internal_error: Some(error.to_string()),
        },
    }
}

fn analyze_in_process(codebase: &Codebase, sources: &[SourceFile]) -> Vec<TaskOutcome> {
    let _span = tracing::info_span!("analyze_files", files = sources.len()).entered();
    sources
        .iter()
        .map(|source| analyze_one(codebase, &source.path, &source.contents))
        .collect()
}

fn analyze_with_pool<'a>(
    codebase: Codebase,
    sources: impl Iterator<Item = &'a SourceFile>,
    thread_count: usize,
) -> Result<(Vec<TaskOutcome>, bool)> {
    // Workers inherit the fully scanned and linked codebase as of spawn
    // time; nothing is shared mutably after this point.
    let codebase = Arc::new(codebase);

    let mut batches: Vec<Vec<(String, String)>> = vec![Vec::new(); thread_count];
    for (index, source) in sources.enumerate() {
        batches[index % thread_count].push((source.path.clone(), source.contents.clone()));
    }

    let outcomes: Rc<RefCell<Vec<TaskOutcome>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&outcomes);

    let task_codebase = Arc::clone(&codebase);
    let mut pool: Pool<TaskOutcome, WorkerSummary> = Pool::new(
        batches,
        WorkerSummary::default,
        move |state, _index, (path, contents): (String, String)| {
            let outcome = analyze_one(&task_codebase, &path, &contents);
            state.files_analyzed += 1;
            if let Some(error) = &outcome.internal_error {
                state.internal_errors.push(error.clone());
            }
            outcome
        },
        |state| state,
        Some(Box::new(move |outcome: TaskOutcome| {
            sink.borrow_mut().push(outcome);
        })),
    )?;

    let worker_summaries = pool.wait();
    let mut had_error = pool.did_have_error();

    for worker_summary in &worker_summaries {
        tracing::debug!(files = worker_summary.files_analyzed, "worker finished");
        for error in &worker_summary.internal_errors {
            tracing::error!(%error, "internal analysis error");
            had_error = true;
        }
    }

    let outcomes = outcomes.take();
    Ok((outcomes, had_error))
}

fn report(sources: &[SourceFile], mut outcomes: Vec<TaskOutcome>, summary: &mut RunSummary) {
    // Cross-worker arrival order is unspecified; sort by the embedded keys.
    outcomes.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    for outcome in &outcomes {
        if let Some(error) = &outcome.internal_error {
            eprintln!("{}: {error}", outcome.file_path);
            summary.had_infra_error = true;
        }

        let contents = sources
            .iter()
            .find(|source| source.path == outcome.file_path)
            .map(|source| source.contents.as_str())
            .unwrap_or("");

        for issue in &outcome.issues {
            let line = issue.location.line_in(contents);
            let header = match issue.severity {
                Severity::Error => {
                    summary.error_count += 1;
                    "ERROR".red().bold()
                }
                _ => {
                    summary.info_count += 1;
                    "INFO".yellow().bold()
                }
            };
            println!(
                "{header}: {} - {}:{line} - {}",
                issue.kind, outcome.file_path, issue.message
            );
        }

        for edit in &outcome.edits {
            let line = stanza_common::CodeLocation::new(
                outcome.file_path.clone(),
                edit.function_span,
            )
            .line_in(contents);
            println!(
                "{}: {} at {}:{line} now returns {}",
                "FIXED".green().bold(),
                edit.cased_id,
                outcome.file_path,
                edit.native_type.as_deref().unwrap_or(&edit.docblock_type)
            );
        }
    }

    if summary.error_count == 0 && !summary.had_infra_error {
        println!("{}", "No errors found!".green());
    } else if summary.error_count > 0 {
        println!(
            "{}",
            format!("{} errors found", summary.error_count).red().bold()
        );
    }
}
