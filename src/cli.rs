// src/cli.rs
//! CLI definitions for eclean
//!
//! The command handlers live in the `commands` module. Every command only
//! reports what could be removed; nothing is ever deleted.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eclean")]
#[command(author = "eclean contributors")]
#[command(version)]
#[command(about = "Find obsolete source archives and binary packages", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print progress messages and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Treat an inaccessible cache directory as empty
    #[arg(long, global = true)]
    pub ignore_failure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by both selectors
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Keep only what installed packages need
    #[arg(short, long)]
    pub destructive: bool,

    /// With --destructive, keep every available version of installed packages
    #[arg(short = 'n', long)]
    pub package_names: bool,

    /// Keep artifacts younger than this age (e.g. 2w3d; units y m w d h)
    #[arg(short, long, value_name = "AGE")]
    pub time_limit: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report obsolete source archives in DISTDIR
    Distfiles {
        #[command(flatten)]
        common: CommonArgs,

        /// With --destructive, keep sources of fetch-restricted packages
        #[arg(short, long)]
        fetch_restricted: bool,

        /// Keep files at least this large (e.g. 50M; units G M K B)
        #[arg(short, long, value_name = "SIZE")]
        size_limit: Option<String>,

        /// Also report files of excluded packages, without rescuing them
        #[arg(long)]
        deprecated: bool,

        /// Override the distfiles directory
        #[arg(long, value_name = "DIR")]
        distdir: Option<PathBuf>,
    },

    /// Report obsolete binary packages in PKGDIR
    Packages {
        #[command(flatten)]
        common: CommonArgs,

        /// Report older builds that share version and USE with a newer one
        #[arg(short, long)]
        unique_use: bool,

        /// Report binary packages whose runtime dependencies changed
        #[arg(short = 'C', long)]
        changed_deps: bool,

        /// Override the binary package directory
        #[arg(long, value_name = "DIR")]
        pkgdir: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
