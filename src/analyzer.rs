// src/analyzer.rs

use crate::aggregate;
use crate::blame::{parse_porcelain, BlameQuery, GitCliBlame};
use crate::config::Config;
use crate::error::Result;
use crate::history;
use crate::model::{AnalysisResult, BlameRecord, WalkStats};
use crate::renderer;
use crate::store::{self, RecordWriter};
use crate::walker::{count_visible_files, RawBlame, Walker};
use chrono::{DateTime, Utc};
use git2::Repository;
use indicatif::ProgressBar;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Runs the whole pipeline over a working tree with `git blame`.
pub fn analyze(worktree: &Path, repo_name: &str, config: &Config) -> Result<AnalysisResult> {
    let query = GitCliBlame::new(worktree);
    analyze_with(worktree, repo_name, config, &query, Utc::now())
}

/// Same as [`analyze`], with the blame query and the clock supplied.
pub fn analyze_with<Q: BlameQuery>(
    worktree: &Path,
    repo_name: &str,
    config: &Config,
    query: &Q,
    now: DateTime<Utc>,
) -> Result<AnalysisResult> {
    info!("Analyzing repository at: {}", worktree.display());

    // 1. Blame every file into the record store
    let blame_csv = config.blame_csv(repo_name);
    let (walk, record_count) = blames_to_file(worktree, &blame_csv, config, query)?;
    info!(
        "Finished parsing blames of {} - {} files ({} skipped, {} failed) in {} directories",
        repo_name,
        walk.files,
        walk.skipped(),
        walk.failed,
        walk.directories
    );

    // 2. Optional commit history
    let commit_csv = if config.collect_commits {
        Some(commits_to_file(worktree, &config.commit_csv(repo_name))?)
    } else {
        None
    };

    // 3. Reload and aggregate
    let records = store::read_blames(&blame_csv)?;
    let cutoff = aggregate::cutoff_timestamp(now, config.old_after_months);
    let metrics = aggregate::file_metrics(&records, cutoff)?;
    let tree = aggregate::build_tree(&metrics)?;

    // 4. Emit
    let flare_json = config.flare_json();
    renderer::write_flare(&tree, &flare_json)?;

    Ok(AnalysisResult {
        tree,
        metrics,
        walk,
        record_count,
        blame_csv,
        commit_csv,
        flare_json,
    })
}

fn blames_to_file<Q: BlameQuery>(
    worktree: &Path,
    out: &Path,
    config: &Config,
    query: &Q,
) -> Result<(WalkStats, usize)> {
    let mut writer = store::blame_writer(out)?;

    let bar = if config.progress {
        ProgressBar::new(count_visible_files(worktree) as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_message("Parsing blames");
    let walker = Walker::new(worktree, query).with_progress(bar.clone());

    let walk = if config.jobs > 1 {
        let (blames, walk) = walker.blame_parallel(config.jobs)?;
        for raw in &blames {
            write_parsed(&mut writer, raw)?;
        }
        walk
    } else {
        let mut blames = walker.blames();
        for raw in blames.by_ref() {
            write_parsed(&mut writer, &raw)?;
        }
        blames.stats()
    };
    bar.finish_with_message("Blame complete");

    let written = writer.written();
    writer.finish()?;
    info!("Wrote {} blame records to {}", written, out.display());
    Ok((walk, written))
}

fn write_parsed<W: Write>(writer: &mut RecordWriter<W>, raw: &RawBlame) -> Result<()> {
    let parsed = parse_porcelain(&raw.output, &raw.path);
    if parsed.errors.is_empty() {
        check_line_numbers(&raw.path, &parsed.records);
    }
    writer.write_all(&parsed.records)
}

/// Warns when a file's line numbers are not exactly 1..=n.
fn check_line_numbers(path: &str, records: &[BlameRecord]) {
    let contiguous = records
        .iter()
        .enumerate()
        .all(|(idx, r)| r.line_number as usize == idx + 1);
    if !contiguous {
        warn!("Blame of {} does not cover lines 1..={} in order", path, records.len());
    }
}

fn commits_to_file(worktree: &Path, out: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(worktree)?;
    let stats = history::commit_stats(&repo)?;
    let written = store::write_commits(out, &stats)?;
    info!("Wrote {} commit file changes to {}", written, out.display());
    Ok(out.to_path_buf())
}
