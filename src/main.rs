// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Distfiles {
            common,
            fetch_restricted,
            size_limit,
            deprecated,
            distdir,
        } => commands::cmd_distfiles(
            &cli,
            common,
            *fetch_restricted,
            size_limit.as_deref(),
            *deprecated,
            distdir.as_deref(),
        ),
        Commands::Packages {
            common,
            unique_use,
            changed_deps,
            pkgdir,
        } => commands::cmd_packages(&cli, common, *unique_use, *changed_deps, pkgdir.as_deref()),
        Commands::Completions { shell } => commands::cmd_completions(*shell),
    }
}
