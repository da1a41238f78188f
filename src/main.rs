// src/main.rs

use anyhow::Result;
use clap::Parser;
use git_flare::cli::Args;
use git_flare::config::Config;
use git_flare::repository::RemoteLocator;
use git_flare::{logging, Source};
use std::time::Instant;
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from(&args);
    logging::init(&config);
    let start_time = Instant::now();

    let source = match (&args.path, &args.remote_url) {
        (Some(path), _) => Source::Local(path.clone()),
        (None, Some(url)) => Source::Remote(RemoteLocator::parse(url)?),
        (None, None) => anyhow::bail!("either a remote url or --path is required"),
    };

    let result = git_flare::run(&source, &config)?;

    info!(
        "Analysis finished in {:.2?}. Found {} files, {} blame records.",
        start_time.elapsed(),
        result.metrics.len(),
        result.record_count
    );
    if let Some(commits) = &result.commit_csv {
        info!("Commit stats: {}", commits.display());
    }
    println!("{}", result.flare_json.display());
    Ok(())
}
