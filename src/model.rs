// src/model.rs

use serde::{Deserialize, Serialize};

/// One line of one file at HEAD, attributed to the commit that last touched it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameRecord {
    pub sha: String,
    /// 1-based line number in the current file
    pub line_number: u32,
    pub author: String,
    #[serde(rename = "author-mail")]
    pub author_mail: String,
    /// Epoch seconds
    #[serde(rename = "author-time")]
    pub author_time: Option<i64>,
    #[serde(rename = "author-tz")]
    pub author_tz: String,
    pub committer: String,
    #[serde(rename = "committer-mail")]
    pub committer_mail: String,
    #[serde(rename = "committer-time")]
    pub committer_time: Option<i64>,
    #[serde(rename = "committer-tz")]
    pub committer_tz: String,
    pub summary: String,
    /// Repository-relative path, `/`-separated
    pub file_path: String,
    pub changed_line: String,
}

/// Change stats for one file touched by one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatRecord {
    pub filename: String,
    pub insertions: usize,
    pub deletions: usize,
    /// insertions + deletions
    pub lines: usize,
    pub author: String,
    pub sha: String,
    pub authored_date_timestamp: i64,
    pub authored_date: String,
}

/// Per-file rollup of blame records
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetric {
    pub file_path: String,
    pub loc: usize,
    pub author_count: usize,
    pub old_lines: usize,
    pub new_lines: usize,
    /// old_lines / loc, rounded to two decimals
    pub fraction_old: f64,
    /// Unique, sorted
    pub authors: Vec<String>,
}

/// A node of the packed-circle input tree.
///
/// Serializes untagged: directories as `{name, children}`, files as
/// `{name, size, authors, author_count, fraction_of_lines_older_6_months}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlareNode {
    Directory {
        name: String,
        children: Vec<FlareNode>,
    },
    File {
        name: String,
        size: usize,
        authors: String,
        author_count: usize,
        fraction_of_lines_older_6_months: String,
    },
}

impl FlareNode {
    /// The synthetic root, a directory named `.`
    pub fn root() -> Self {
        FlareNode::Directory {
            name: ".".to_string(),
            children: Vec::new(),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        FlareNode::Directory {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FlareNode::Directory { name, .. } | FlareNode::File { name, .. } => name,
        }
    }

    /// Children of a directory; `None` for files
    pub fn children(&self) -> Option<&[FlareNode]> {
        match self {
            FlareNode::Directory { children, .. } => Some(children),
            FlareNode::File { .. } => None,
        }
    }

    /// Looks up a direct child by name
    pub fn child(&self, name: &str) -> Option<&FlareNode> {
        self.children()?.iter().find(|c| c.name() == name)
    }
}

/// Counters collected while walking the working tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Regular files seen, including skipped ones
    pub files: usize,
    pub directories: usize,
    pub pruned_directories: usize,
    pub skipped_hidden: usize,
    pub skipped_binary: usize,
    /// Files whose blame query failed
    pub failed: usize,
    pub unreadable: usize,
}

impl WalkStats {
    pub fn skipped(&self) -> usize {
        self.skipped_hidden + self.skipped_binary
    }
}

/// Outcome of a full run
#[derive(Debug)]
pub struct AnalysisResult {
    pub tree: FlareNode,
    pub metrics: Vec<FileMetric>,
    pub walk: WalkStats,
    pub record_count: usize,
    pub blame_csv: std::path::PathBuf,
    pub commit_csv: Option<std::path::PathBuf>,
    pub flare_json: std::path::PathBuf,
}
