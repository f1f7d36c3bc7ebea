// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: destructive mode
fn destructive_arg() -> Arg {
    Arg::new("destructive")
        .short('d')
        .long("destructive")
        .action(ArgAction::SetTrue)
        .help("Keep only what installed packages need")
}

/// Common argument: keep all versions of installed package names
fn package_names_arg() -> Arg {
    Arg::new("package_names")
        .short('n')
        .long("package-names")
        .action(ArgAction::SetTrue)
        .help("With --destructive, keep every available version of installed packages")
}

/// Common argument: age limit
fn time_limit_arg() -> Arg {
    Arg::new("time_limit")
        .short('t')
        .long("time-limit")
        .value_name("AGE")
        .help("Keep artifacts younger than this age (e.g. 2w3d; units y m w d h)")
}

fn build_cli() -> Command {
    Command::new("eclean")
        .version(env!("CARGO_PKG_VERSION"))
        .author("eclean contributors")
        .about("Find obsolete source archives and binary packages")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file (TOML)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Print progress messages and debug logging"),
        )
        .arg(
            Arg::new("ignore_failure")
                .long("ignore-failure")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Treat an inaccessible cache directory as empty"),
        )
        .subcommand(
            Command::new("distfiles")
                .about("Report obsolete source archives in DISTDIR")
                .arg(destructive_arg())
                .arg(package_names_arg())
                .arg(time_limit_arg())
                .arg(
                    Arg::new("fetch_restricted")
                        .short('f')
                        .long("fetch-restricted")
                        .action(ArgAction::SetTrue)
                        .help("With --destructive, keep sources of fetch-restricted packages"),
                )
                .arg(
                    Arg::new("size_limit")
                        .short('s')
                        .long("size-limit")
                        .value_name("SIZE")
                        .help("Keep files at least this large (e.g. 50M; units G M K B)"),
                )
                .arg(
                    Arg::new("deprecated")
                        .long("deprecated")
                        .action(ArgAction::SetTrue)
                        .help("Also report files of excluded packages, without rescuing them"),
                )
                .arg(
                    Arg::new("distdir")
                        .long("distdir")
                        .value_name("DIR")
                        .help("Override the distfiles directory"),
                ),
        )
        .subcommand(
            Command::new("packages")
                .about("Report obsolete binary packages in PKGDIR")
                .arg(destructive_arg())
                .arg(package_names_arg())
                .arg(time_limit_arg())
                .arg(
                    Arg::new("unique_use")
                        .short('u')
                        .long("unique-use")
                        .action(ArgAction::SetTrue)
                        .help("Report older builds that share version and USE with a newer one"),
                )
                .arg(
                    Arg::new("changed_deps")
                        .short('C')
                        .long("changed-deps")
                        .action(ArgAction::SetTrue)
                        .help("Report binary packages whose runtime dependencies changed"),
                )
                .arg(
                    Arg::new("pkgdir")
                        .long("pkgdir")
                        .value_name("DIR")
                        .help("Override the binary package directory"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell to generate completions for"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("eclean.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
