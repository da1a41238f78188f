// src/repository.rs

use crate::config::Config;
use crate::error::{FlareError, Result};
use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks, Repository};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A validated remote URL and the repository name derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocator {
    pub url: String,
    /// Text between the last `/` and the `.git` suffix
    pub name: String,
}

impl RemoteLocator {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || FlareError::InvalidLocator(url.to_string());
        let stem = url.strip_suffix(".git").ok_or_else(invalid)?;
        let (_, name) = stem.rsplit_once('/').ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            url: url.to_string(),
            name: name.to_string(),
        })
    }

    /// `<workspace>/temp/repositories/<project>/<name>`
    pub fn working_dir(&self, config: &Config) -> PathBuf {
        config
            .workspace
            .join("temp")
            .join("repositories")
            .join(&config.project)
            .join(&self.name)
    }
}

/// Reuses the clone in the workspace when there is one, clones otherwise.
pub fn acquire(locator: &RemoteLocator, config: &Config) -> Result<Repository> {
    let workdir = locator.working_dir(config);
    match Repository::open(&workdir) {
        Ok(repo) => {
            info!("Using existing clone of {} at {}", locator.url, workdir.display());
            Ok(repo)
        }
        Err(e) => {
            debug!("{} is not a usable repository: {}", workdir.display(), e);
            clone(locator, &workdir, config.ssh_key.as_deref())
        }
    }
}

fn clone(locator: &RemoteLocator, workdir: &Path, ssh_key: Option<&Path>) -> Result<Repository> {
    info!("Cloning {} to {}", locator.url, workdir.display());

    let mut callbacks = RemoteCallbacks::new();
    if let Some(key) = ssh_key {
        let key = key.to_path_buf();
        callbacks.credentials(move |_url, username, _allowed| {
            Cred::ssh_key(username.unwrap_or("git"), None, &key, None)
        });
    }
    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);

    let repo = RepoBuilder::new()
        .fetch_options(fetch_opts)
        .clone(&locator.url, workdir)
        .map_err(|source| FlareError::Clone {
            url: locator.url.clone(),
            path: workdir.to_path_buf(),
            source,
        })?;
    info!("Successfully cloned {} into {}", locator.url, workdir.display());
    Ok(repo)
}

/// The working-tree root of an opened repository.
pub fn workdir(repo: &Repository) -> Result<PathBuf> {
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| FlareError::NoWorkdir(repo.path().to_path_buf()))
}
