mod commands;
mod completion;
mod config;
mod error;
mod executor;
mod history;
mod path;
mod pipeline;
mod redirection;
mod shell;
mod streams;
mod tokenize;

use std::io;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::shell::Shell;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CRABSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut shell = Shell::new(Config::from_env());
    shell.run()
}
