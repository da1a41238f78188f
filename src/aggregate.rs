// src/aggregate.rs

use crate::error::{FlareError, Result};
use crate::model::{BlameRecord, FileMetric, FlareNode};
use chrono::{DateTime, Months, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};

/// Epoch seconds `months` before `now`; lines authored earlier count as old.
pub fn cutoff_timestamp(now: DateTime<Utc>, months: u32) -> i64 {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .timestamp()
}

/// Groups records by file path and summarizes each group.
///
/// Output is sorted by path, independent of record order.
pub fn file_metrics<'a, I>(records: I, cutoff: i64) -> Result<Vec<FileMetric>>
where
    I: IntoIterator<Item = &'a BlameRecord>,
{
    let mut groups: BTreeMap<&str, Vec<&BlameRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.file_path.as_str())
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|(path, group)| summarize(path, &group, cutoff))
        .collect()
}

fn summarize(path: &str, group: &[&BlameRecord], cutoff: i64) -> Result<FileMetric> {
    if group.is_empty() {
        return Err(FlareError::EmptyGroup(path.to_string()));
    }

    let loc = group.len();
    let authors: BTreeSet<&str> = group.iter().map(|r| r.author.as_str()).collect();
    // a line with no author-time is never counted as old
    let old_lines = group
        .iter()
        .filter(|r| r.author_time.is_some_and(|t| t < cutoff))
        .count();

    Ok(FileMetric {
        file_path: path.to_string(),
        loc,
        author_count: authors.len(),
        old_lines,
        new_lines: loc - old_lines,
        fraction_old: round2(old_lines as f64 / loc as f64),
        authors: authors.into_iter().map(String::from).collect(),
    })
}

/// Two decimals, exact halves to the even neighbour.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Folds file metrics into a directory tree rooted at `.`.
///
/// Directories are created on first encounter and keep insertion order.
pub fn build_tree(metrics: &[FileMetric]) -> Result<FlareNode> {
    let mut root = FlareNode::root();
    if let FlareNode::Directory { children, .. } = &mut root {
        for metric in metrics {
            insert_leaf(children, metric)?;
        }
    }
    Ok(root)
}

fn insert_leaf(root_children: &mut Vec<FlareNode>, metric: &FileMetric) -> Result<()> {
    let conflict = || FlareError::PathConflict(metric.file_path.clone());
    let path = Path::new(&metric.file_path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(conflict)?;

    let mut children = root_children;
    for component in path.parent().into_iter().flat_map(Path::components) {
        let Component::Normal(segment) = component else {
            continue;
        };
        let segment = segment.to_string_lossy().into_owned();

        let idx = match children.iter().position(|c| c.name() == segment) {
            Some(idx) => idx,
            None => {
                children.push(FlareNode::directory(segment));
                children.len() - 1
            }
        };
        let current = children;
        children = match &mut current[idx] {
            FlareNode::Directory { children: nested, .. } => nested,
            FlareNode::File { .. } => return Err(conflict()),
        };
    }

    if children.iter().any(|c| c.name() == file_name) {
        return Err(conflict());
    }
    children.push(FlareNode::File {
        name: file_name,
        size: metric.loc,
        authors: metric.authors.join(","),
        author_count: metric.author_count,
        fraction_of_lines_older_6_months: format!("{:.2}", metric.fraction_old),
    });
    Ok(())
}
