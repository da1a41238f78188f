// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate flare.json for a packed circle visualization of a git repository",
    long_about = None
)]
pub struct Args {
    /// Remote url of a git repository, e.g. https://github.com/sample/sample.git
    #[arg(required_unless_present = "path", conflicts_with = "path")]
    pub remote_url: Option<String>,

    /// Show debug messages, e.g. information on parsed files
    #[arg(short, long)]
    pub verbose: bool,

    /// Analyze an existing working tree instead of cloning a remote
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Directory that holds clones and generated files
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Project name, used to group clones and CSV files
    #[arg(long, default_value = "")]
    pub project: String,

    /// Private key used to authenticate SSH remotes
    #[arg(long)]
    pub ssh_key: Option<PathBuf>,

    /// Number of concurrent git blame processes
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Lines last authored more than this many months ago count as old
    #[arg(long, default_value_t = 3)]
    pub old_after_months: u32,

    /// Also write per-commit file change stats
    #[arg(long)]
    pub commits: bool,

    /// Where to write flare.json (default: <workspace>/files/flare.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
