// src/lib.rs

// git-flare: per-line authorship of a git repository rolled up into a
// `flare.json` tree for packed circle visualizations.
//
// The pipeline runs `git blame --line-porcelain` on every visible text file,
// stores the parsed records as CSV, then aggregates them per file and per
// directory.

pub mod aggregate;
pub mod analyzer;
pub mod blame;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod model;
pub mod renderer;
pub mod repository;
pub mod store;
pub mod walker;

use crate::config::Config;
use crate::error::Result;
use crate::model::AnalysisResult;
use crate::repository::RemoteLocator;
use std::path::PathBuf;
use tracing::info;

/// What to analyze
#[derive(Debug, Clone)]
pub enum Source {
    /// Cloned into the workspace unless already there
    Remote(RemoteLocator),
    /// An existing working tree
    Local(PathBuf),
}

/// Acquires the repository and runs the pipeline end to end.
pub fn run(source: &Source, config: &Config) -> Result<AnalysisResult> {
    if config.old_after_months != 6 {
        info!(
            "Lines older than {} months count as old (reported as fraction_of_lines_older_6_months)",
            config.old_after_months
        );
    }

    let (worktree, name) = match source {
        Source::Remote(locator) => {
            let repo = repository::acquire(locator, config)?;
            (repository::workdir(&repo)?, locator.name.clone())
        }
        Source::Local(path) => {
            let name = path
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "repository".to_string());
            (path.clone(), name)
        }
    };

    analyzer::analyze(&worktree, &name, config)
}
