// src/commands.rs

//! Command handlers for the eclean CLI

use crate::cli::{Cli, CommonArgs};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::CommandFactory;
use clap_complete::Shell;
use eclean::catalog::PackagesIndex;
use eclean::output::{LogOutput, OutputSink, SilentOutput};
use eclean::policy::{parse_size_limit, parse_time_limit};
use eclean::{BinpkgSearch, CleanConfig, DistfilesSearch, Error};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load the configuration file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<CleanConfig> {
    match path {
        Some(path) => CleanConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(CleanConfig::default()),
    }
}

/// Merge the shared command-line flags into the configured policy
fn apply_common(config: &mut CleanConfig, common: &CommonArgs, ignore_failure: bool) -> Result<()> {
    let policy = &mut config.policy;
    policy.destructive |= common.destructive;
    policy.package_names |= common.package_names;
    policy.ignore_failure |= ignore_failure;
    if let Some(age) = &common.time_limit {
        policy.time_limit = Some(
            parse_time_limit(age, Utc::now()).with_context(|| format!("Invalid --time-limit '{}'", age))?,
        );
    }
    Ok(())
}

fn output_sink(verbose: bool) -> Box<dyn OutputSink> {
    if verbose {
        Box::new(LogOutput::new("eclean"))
    } else {
        Box::new(SilentOutput)
    }
}

/// Format bytes as human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Size on disk of every path; missing files count as zero
fn total_size<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> u64 {
    paths
        .into_iter()
        .filter_map(|path| fs::symlink_metadata(path).ok())
        .map(|meta| meta.len())
        .sum()
}

/// Render a `name -> paths` listing, one path per line
fn render_listing<K: std::fmt::Display>(entries: &BTreeMap<K, Vec<PathBuf>>) -> Vec<String> {
    entries
        .iter()
        .flat_map(|(key, paths)| {
            paths.iter().map(move |path| {
                let size = total_size([path]);
                format!("  [{:>10}] {} ({})", format_bytes(size), path.display(), key)
            })
        })
        .collect()
}

/// Load the binary package index of `pkgdir`
///
/// An unreadable package directory yields an empty index when `ignore_failure`
/// is set.
fn open_index(pkgdir: &Path, ignore_failure: bool) -> Result<PackagesIndex> {
    match PackagesIndex::open(pkgdir) {
        Ok(index) => Ok(index),
        Err(err @ Error::InaccessibleDirectory { .. }) if ignore_failure => {
            warn!("{}; nothing to clean", err);
            Ok(PackagesIndex::default())
        }
        Err(err) => Err(err).with_context(|| {
            format!("Failed to read binary package index in {}", pkgdir.display())
        }),
    }
}

/// Report obsolete source archives
pub fn cmd_distfiles(
    cli: &Cli,
    common: &CommonArgs,
    fetch_restricted: bool,
    size_limit: Option<&str>,
    deprecated: bool,
    distdir: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_common(&mut config, common, cli.ignore_failure)?;
    config.policy.fetch_restricted |= fetch_restricted;
    if let Some(size) = size_limit {
        config.policy.size_limit =
            Some(parse_size_limit(size).with_context(|| format!("Invalid --size-limit '{}'", size))?);
    }
    if let Some(dir) = distdir {
        config.paths.distdir = dir.to_path_buf();
    }
    config.validate()?;

    let repo = config.paths.repository_store();
    let installed = config.paths.installed_store();
    let output = output_sink(cli.verbose);

    info!("Searching {} for obsolete source archives", config.paths.distdir.display());
    let result = DistfilesSearch::new(&repo, &installed, output.as_ref()).find(
        &config.paths.distdir,
        &config.exclude,
        &config.policy,
        deprecated,
    )?;

    for line in render_listing(&result.obsolete) {
        println!("{}", line);
    }

    if !result.rescued.is_empty() {
        println!();
        println!("Kept because of exclusions:");
        for line in render_listing(&result.rescued) {
            println!("{}", line);
        }
    }

    if !result.deprecated.is_empty() {
        println!();
        println!("Installed packages no longer provided by any repository:");
        for cpv in result.deprecated.keys() {
            println!("  {}", cpv);
        }
    }

    let bytes = total_size(result.obsolete.values().flatten());
    println!();
    println!(
        "Total: {} obsolete files, {}",
        result.obsolete.len(),
        format_bytes(bytes)
    );
    Ok(())
}

/// Report obsolete binary packages
pub fn cmd_packages(
    cli: &Cli,
    common: &CommonArgs,
    unique_use: bool,
    changed_deps: bool,
    pkgdir: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_common(&mut config, common, cli.ignore_failure)?;
    config.policy.unique_use |= unique_use;
    config.policy.changed_deps |= changed_deps;
    if let Some(dir) = pkgdir {
        config.paths.pkgdir = dir.to_path_buf();
    }
    config.validate()?;

    let repo = config.paths.repository_store();
    let installed = config.paths.installed_store();
    let binaries = open_index(&config.paths.pkgdir, config.policy.ignore_failure)?;
    let output = output_sink(cli.verbose);

    info!("Searching {} for obsolete binary packages", config.paths.pkgdir.display());
    let obsolete = BinpkgSearch::new(&binaries, &repo, &installed, output.as_ref()).find(
        &config.paths.pkgdir,
        &config.exclude,
        &config.policy,
    )?;

    for line in render_listing(&obsolete) {
        println!("{}", line);
    }

    let count: usize = obsolete.values().map(Vec::len).sum();
    let bytes = total_size(obsolete.values().flatten());
    println!();
    println!("Total: {} obsolete binary packages, {}", count, format_bytes(bytes));
    Ok(())
}

/// Print a completion script for `shell`
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "eclean", &mut std::io::stdout());
    Ok(())
}
