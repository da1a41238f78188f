// src/config.rs

use crate::cli::Args;
use std::path::PathBuf;

/// Run settings, built once from the command line and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub verbose: bool,
    pub workspace: PathBuf,
    pub project: String,
    pub ssh_key: Option<PathBuf>,
    /// 1 means sequential
    pub jobs: usize,
    pub old_after_months: u32,
    pub collect_commits: bool,
    pub progress: bool,
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            workspace: PathBuf::from("."),
            project: String::new(),
            ssh_key: None,
            jobs: 1,
            old_after_months: 3,
            collect_commits: false,
            progress: false,
            output: None,
        }
    }
}

impl Config {
    pub fn blame_csv(&self, repo_name: &str) -> PathBuf {
        self.workspace
            .join("temp")
            .join("files")
            .join("blames")
            .join(&self.project)
            .join(format!("blames-{repo_name}.csv"))
    }

    pub fn commit_csv(&self, repo_name: &str) -> PathBuf {
        self.workspace
            .join("files")
            .join("commits")
            .join(&self.project)
            .join(format!("commits-{repo_name}.csv"))
    }

    pub fn flare_json(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.workspace.join("files").join("flare.json"))
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            verbose: args.verbose,
            workspace: args.workspace.clone(),
            project: args.project.clone(),
            ssh_key: args.ssh_key.clone(),
            jobs: usize::from(args.jobs),
            old_after_months: args.old_after_months,
            collect_commits: args.commits,
            progress: !args.no_progress,
            output: args.output.clone(),
        }
    }
}
