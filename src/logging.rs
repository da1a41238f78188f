// src/logging.rs

use crate::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the stderr subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init(config: &Config) {
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
