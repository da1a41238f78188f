// src/history.rs

use crate::error::Result;
use crate::model::CommitStatRecord;
use chrono::{TimeZone, Utc};
use git2::{Commit, DiffOptions, ErrorCode, Patch, Repository};
use tracing::{debug, info};

/// Per-file change stats for every commit reachable from HEAD, newest first.
///
/// An unborn HEAD yields no records.
pub fn commit_stats(repo: &Repository) -> Result<Vec<CommitStatRecord>> {
    match repo.head() {
        Ok(_) => {}
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            info!("Repository has no commits yet, no history to collect");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(git2::Sort::TIME)?;

    let mut records = Vec::new();
    let mut commits = 0;
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        records.extend(stats_for_commit(repo, &commit)?);
        commits += 1;
    }

    info!(
        "Collected {} file changes from {} commits",
        records.len(),
        commits
    );
    Ok(records)
}

/// Diffs a commit against its first parent (or the empty tree).
fn stats_for_commit(repo: &Repository, commit: &Commit) -> Result<Vec<CommitStatRecord>> {
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };
    let current_tree = commit.tree()?;

    let mut diff_opts = DiffOptions::new();
    diff_opts.include_untracked(false);
    diff_opts.ignore_filemode(true);

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&current_tree), Some(&mut diff_opts))?;

    let author = commit.author().name().unwrap_or("Unknown").to_string();
    let sha = commit.id().to_string();
    let authored = commit.author().when().seconds();
    let authored_date = Utc
        .timestamp_opt(authored, 0)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    let mut records = Vec::with_capacity(diff.deltas().len());
    for (idx, delta) in diff.deltas().enumerate() {
        let Some(path) = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
        else {
            continue;
        };
        let filename = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        // binary deltas have no patch
        let (insertions, deletions) = match Patch::from_diff(&diff, idx)? {
            Some(patch) => {
                let (_, additions, deletions) = patch.line_stats()?;
                (additions, deletions)
            }
            None => (0, 0),
        };

        debug!("{} {}: +{} -{}", &sha[..sha.len().min(12)], filename, insertions, deletions);
        records.push(CommitStatRecord {
            filename,
            insertions,
            deletions,
            lines: insertions + deletions,
            author: author.clone(),
            sha: sha.clone(),
            authored_date_timestamp: authored,
            authored_date: authored_date.clone(),
        });
    }
    Ok(records)
}
