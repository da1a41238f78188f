// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlareError>;

/// Fatal errors: any of these aborts the run
#[derive(Debug, Error)]
pub enum FlareError {
    #[error("the URL {0:?} doesn't look like a git remote, expected e.g. https://github.com/project/repo.git")]
    InvalidLocator(String),

    #[error("failed to clone {url} into {}: {source}", .path.display())]
    Clone {
        url: String,
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("repository at {0} has no working directory")]
    NoWorkdir(PathBuf),

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("could not start blame workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("no blame records grouped under {0}")]
    EmptyGroup(String),

    #[error("path {0} is both a file and a directory")]
    PathConflict(String),
}

impl FlareError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        FlareError::Io {
            context: context.into(),
            source,
        }
    }
}

/// A blame query that could not produce output for one file
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("could not run git blame on {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git blame on {path} exited with {status}: {stderr}")]
    Failed {
        path: String,
        status: String,
        stderr: String,
    },
}

/// A malformed line group in porcelain output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line of the raw output where the group starts
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("header {0:?} is not `sha orig-line final-line`")]
    BadCommitHeader(String),
    #[error("{key} value {value:?} is not an integer timestamp")]
    BadTimestamp { key: String, value: String },
    #[error("content line without a header")]
    MissingHeader,
    #[error("header lines without a content line")]
    MissingContent,
}
