// src/blame/query.rs

// Line-level authorship queries.

use crate::error::QueryError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs a blame query for one file of a working tree.
///
/// Implementations return the raw `--line-porcelain` text; parsing happens in
/// [`crate::blame::parse_porcelain`].
pub trait BlameQuery: Sync {
    /// `relative_path` is relative to the working-tree root, `/`-separated.
    fn blame(&self, relative_path: &str) -> Result<String, QueryError>;
}

/// Shells out to `git blame -M --line-porcelain` in the working tree.
pub struct GitCliBlame {
    workdir: PathBuf,
}

impl GitCliBlame {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }
}

impl BlameQuery for GitCliBlame {
    fn blame(&self, relative_path: &str) -> Result<String, QueryError> {
        let output = Command::new("git")
            .args(["blame", "-M", "--line-porcelain", "--"])
            .arg(relative_path)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| QueryError::Spawn {
                path: relative_path.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QueryError::Failed {
                path: relative_path.to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        // Non UTF-8 content is replaced rather than rejected
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl<F> BlameQuery for F
where
    F: Fn(&str) -> Result<String, QueryError> + Sync,
{
    fn blame(&self, relative_path: &str) -> Result<String, QueryError> {
        self(relative_path)
    }
}
