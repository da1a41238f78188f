// src/walker.rs

use crate::blame::BlameQuery;
use crate::error::Result;
use crate::model::WalkStats;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// How many leading bytes are inspected to classify a file
const SNIFF_LEN: u64 = 1024;

/// Raw blame output for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlame {
    /// Relative to the working-tree root, `/`-separated
    pub path: String,
    pub output: String,
}

/// Drives blame queries over every visible text file of a working tree.
pub struct Walker<'q, Q: BlameQuery> {
    root: PathBuf,
    query: &'q Q,
    progress: ProgressBar,
}

impl<'q, Q: BlameQuery> Walker<'q, Q> {
    pub fn new(root: &Path, query: &'q Q) -> Self {
        Self {
            root: root.to_path_buf(),
            query,
            progress: ProgressBar::hidden(),
        }
    }

    /// Ticks `progress` once per visible file during sequential walks.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Lazily yields relative paths of the files that will be blamed.
    pub fn candidates(&self) -> Candidates {
        Candidates {
            root: self.root.clone(),
            entries: WalkDir::new(&self.root).sort_by_file_name().into_iter(),
            stats: WalkStats::default(),
            progress: self.progress.clone(),
        }
    }

    /// Lazily yields raw blame output, one file at a time.
    ///
    /// Files whose query fails are logged, counted and skipped.
    pub fn blames(&self) -> Blames<'_, Q> {
        Blames {
            candidates: self.candidates(),
            query: self.query,
            failed: 0,
        }
    }

    /// Blames all candidates on a pool of `jobs` threads.
    ///
    /// The result is in the same path order a sequential walk produces.
    pub fn blame_parallel(&self, jobs: usize) -> Result<(Vec<RawBlame>, WalkStats)> {
        let mut candidates = Candidates {
            progress: ProgressBar::hidden(),
            ..self.candidates()
        };
        let paths: Vec<String> = candidates.by_ref().collect();
        let mut stats = candidates.stats();

        self.progress.set_length(paths.len() as u64);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        let query = self.query;
        // indexed collect keeps the walk order
        let results: Vec<_> = pool.install(|| {
            paths
                .into_par_iter()
                .progress_with(self.progress.clone())
                .map(|path| {
                    let result = query.blame(&path);
                    (path, result)
                })
                .collect()
        });

        let mut blames = Vec::with_capacity(results.len());
        for (path, result) in results {
            match result {
                Ok(output) => blames.push(RawBlame { path, output }),
                Err(err) => {
                    warn!("Skipping {}: {}", path, err);
                    stats.failed += 1;
                }
            }
        }
        Ok((blames, stats))
    }
}

/// Visible, non-binary regular files under a root, in file-name order.
pub struct Candidates {
    root: PathBuf,
    entries: walkdir::IntoIter,
    stats: WalkStats,
    progress: ProgressBar,
}

impl Candidates {
    pub fn stats(&self) -> WalkStats {
        self.stats
    }
}

impl Iterator for Candidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    self.stats.unreadable += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                // The root is walked whatever its name is
                if entry.depth() == 0 {
                    info!("Parsing files of {}", entry.path().display());
                } else if is_hidden(&entry) {
                    debug!("Skipped dot-folder {}", entry.path().display());
                    self.stats.pruned_directories += 1;
                    self.entries.skip_current_dir();
                } else {
                    info!("Parsing files of {}", entry.path().display());
                    self.stats.directories += 1;
                }
                continue;
            }
            if !entry.file_type().is_file() {
                debug!("Skipped non-regular file {}", entry.path().display());
                continue;
            }

            self.stats.files += 1;
            let relative = relative_path(&self.root, entry.path());
            if is_hidden(&entry) {
                debug!("Skipped dot-file {}", relative);
                self.stats.skipped_hidden += 1;
                continue;
            }

            self.progress.inc(1);
            match is_binary(entry.path()) {
                Ok(true) => {
                    debug!(
                        "Progress {}/{} - skipped binary file {}",
                        self.progress.position(),
                        self.progress.length().unwrap_or(0),
                        relative
                    );
                    self.stats.skipped_binary += 1;
                }
                Ok(false) => {
                    debug!(
                        "Progress {}/{} - parsing blames of file {}",
                        self.progress.position(),
                        self.progress.length().unwrap_or(0),
                        relative
                    );
                    return Some(relative);
                }
                Err(err) => {
                    warn!("Skipping {}: {}", relative, err);
                    self.stats.unreadable += 1;
                }
            }
        }
    }
}

/// Raw blame output of each candidate, skipping files whose query failed.
pub struct Blames<'w, Q: BlameQuery> {
    candidates: Candidates,
    query: &'w Q,
    failed: usize,
}

impl<Q: BlameQuery> Blames<'_, Q> {
    /// Counters so far; complete once the iterator is exhausted.
    pub fn stats(&self) -> WalkStats {
        WalkStats {
            failed: self.failed,
            ..self.candidates.stats()
        }
    }
}

impl<Q: BlameQuery> Iterator for Blames<'_, Q> {
    type Item = RawBlame;

    fn next(&mut self) -> Option<RawBlame> {
        for path in self.candidates.by_ref() {
            match self.query.blame(&path) {
                Ok(output) => return Some(RawBlame { path, output }),
                Err(err) => {
                    warn!("Skipping {}: {}", path, err);
                    self.failed += 1;
                }
            }
        }
        None
    }
}

/// Number of files outside dot-folders that are not dot-files themselves.
pub fn count_visible_files(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Sniffs the head of a file to decide whether it is binary.
pub fn is_binary(path: &Path) -> std::io::Result<bool> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(looks_binary(&head))
}

/// Content heuristic: NUL bytes mean binary, (possibly truncated) UTF-8 means
/// text, otherwise more than 30% control bytes means binary.
pub fn looks_binary(head: &[u8]) -> bool {
    if head.is_empty() {
        return false;
    }
    if head.contains(&0) {
        return true;
    }
    match std::str::from_utf8(head) {
        Ok(_) => return false,
        // a multi-byte character cut off by the sniff window
        Err(e) if e.error_len().is_none() => return false,
        Err(_) => {}
    }
    let control = head.iter().filter(|b| is_control(**b)).count();
    control * 10 > head.len() * 3
}

fn is_control(b: u8) -> bool {
    match b {
        b'\t' | b'\n' | b'\r' | 0x08 | 0x0c | 0x1b => false,
        0..=0x1f | 0x7f => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn fake_blame(root: &Path) -> impl Fn(&str) -> std::result::Result<String, QueryError> + Sync {
        let root = root.to_path_buf();
        move |path: &str| {
            let text = fs::read_to_string(root.join(path)).map_err(|source| QueryError::Spawn {
                path: path.to_string(),
                source,
            })?;
            Ok(text
                .lines()
                .enumerate()
                .map(|(i, l)| format!("abc {n} {n} 1\nauthor tester\n\t{l}\n", n = i + 1))
                .collect())
        }
    }

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_skips_hidden_and_binary() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", b"one\ntwo\n");
        write(dir.path(), ".env", b"SECRET=1\n");
        write(dir.path(), "image.png", &[0x89, b'P', b'N', b'G', 0, 0, 0, 13]);
        write(dir.path(), "dir/b.txt", b"x\n");
        write(dir.path(), ".git/config", b"[core]\n");
        write(dir.path(), "dir/.cache/c.txt", b"y\n");

        let query = fake_blame(dir.path());
        let walker = Walker::new(dir.path(), &query);
        let mut blames = walker.blames();
        let paths: Vec<String> = blames.by_ref().map(|b| b.path).collect();

        assert_eq!(paths, vec!["a.txt".to_string(), "dir/b.txt".to_string()]);
        let stats = blames.stats();
        assert_eq!(stats.files, 4);
        assert_eq!(stats.skipped_hidden, 1);
        assert_eq!(stats.skipped_binary, 1);
        assert_eq!(stats.pruned_directories, 2);
        assert_eq!(stats.directories, 1);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_failed_query_does_not_abort_walk() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", b"a\n");
        write(dir.path(), "b.txt", b"b\n");
        write(dir.path(), "c.txt", b"c\n");

        let query = |path: &str| {
            if path == "b.txt" {
                Err(QueryError::Failed {
                    path: path.to_string(),
                    status: "exit status: 128".to_string(),
                    stderr: "fatal: no such path 'b.txt' in HEAD".to_string(),
                })
            } else {
                Ok(format!("abc 1 1 1\n\t{path}\n"))
            }
        };
        let walker = Walker::new(dir.path(), &query);
        let mut blames = walker.blames();
        let paths: Vec<String> = blames.by_ref().map(|b| b.path).collect();

        assert_eq!(paths, vec!["a.txt".to_string(), "c.txt".to_string()]);
        assert_eq!(blames.stats().failed, 1);
    }

    #[test]
    fn test_walk_is_lazy() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", b"a\n");
        write(dir.path(), "b.txt", b"b\n");

        let calls = Mutex::new(Vec::new());
        let query = |path: &str| {
            calls.lock().unwrap().push(path.to_string());
            Ok::<_, QueryError>(String::new())
        };
        let walker = Walker::new(dir.path(), &query);
        let mut blames = walker.blames();

        assert_eq!(blames.next().map(|b| b.path), Some("a.txt".to_string()));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempdir().unwrap();
        for name in ["z.txt", "m/n.txt", "a.txt", "m/a.txt", "q/r/s.txt"] {
            write(dir.path(), name, b"l1\nl2\n");
        }
        let query = fake_blame(dir.path());
        let walker = Walker::new(dir.path(), &query);

        let sequential: Vec<RawBlame> = walker.blames().collect();
        let (parallel, stats) = walker.blame_parallel(4).unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(stats.files, 5);
    }

    #[test]
    fn test_count_visible_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", b"a\n");
        write(dir.path(), ".hidden", b"a\n");
        write(dir.path(), ".git/HEAD", b"ref\n");
        write(dir.path(), "src/main.rs", b"fn main() {}\n");
        assert_eq!(count_visible_files(dir.path()), 2);
    }

    #[test]
    fn test_looks_binary() {
        assert!(!looks_binary(b""));
        assert!(!looks_binary(b"plain text\n"));
        assert!(!looks_binary("grüße\n".as_bytes()));
        assert!(looks_binary(b"GIF89a\x00\x01"));
        assert!(looks_binary(&[0x01, 0x02, 0x03, 0xff, 0x04, 0x05]));
        // latin-1 text is not UTF-8 but has no control bytes
        assert!(!looks_binary(b"caf\xe9 cr\xe8me\n"));
        // truncated multi-byte character at the end of the window
        assert!(!looks_binary(&"é".as_bytes()[..1]));
    }
}
