// src/lib.rs

//! eclean: obsolete build artifact selection
//!
//! Decides which downloaded source archives and prebuilt binary packages in
//! a source-based distribution's caches are no longer needed by any
//! installed or buildable package.
//!
//! # Architecture
//!
//! - Stores: package metadata is read through the `PackageStore` and
//!   `BinaryStore` traits; nothing is cached between queries
//! - Selectors: `DistfilesSearch` and `BinpkgSearch` classify artifacts;
//!   neither deletes anything
//! - Policy: flags and limits are passed in at call time, no global state
//!
//! ```no_run
//! use eclean::catalog::{Md5CacheRepo, VdbStore};
//! use eclean::output::SilentOutput;
//! use eclean::{CleanPolicy, DistfilesSearch, ExcludeSpec};
//! use std::path::Path;
//!
//! # fn main() -> eclean::Result<()> {
//! let repo = Md5CacheRepo::new(["/var/db/repos/gentoo"]);
//! let installed = VdbStore::default();
//! let result = DistfilesSearch::new(&repo, &installed, &SilentOutput).find(
//!     Path::new("/var/cache/distfiles"),
//!     &ExcludeSpec::new(),
//!     &CleanPolicy::new(),
//!     false,
//! )?;
//! for name in result.obsolete.keys() {
//!     println!("{}", name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod binpkgs;
pub mod catalog;
pub mod config;
pub mod cpv;
pub mod depend;
pub mod distfiles;
mod error;
pub mod exclude;
pub mod output;
pub mod policy;

pub use binpkgs::{BinpkgSearch, ObsoleteBinaries};
pub use catalog::{AuxKey, BinaryPackage, BinaryStore, PackageStore};
pub use config::{CleanConfig, PathsConfig};
pub use cpv::Cpv;
pub use distfiles::{DistfilesResult, DistfilesSearch};
pub use error::{Error, Result};
pub use exclude::ExcludeSpec;
pub use output::{CallbackOutput, CollectOutput, LogOutput, OutputSink, SilentOutput};
pub use policy::CleanPolicy;
