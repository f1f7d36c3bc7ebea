// src/error.rs

//! Error types shared by the selectors, stores and parsers

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while selecting obsolete artifacts
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading a store or cache directory
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Identifier absent from a package store
    #[error("Package not found: {0}")]
    NotFound(String),

    /// Malformed metadata, dependency string or limit specification
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Package identifier that is not `category/name-version`
    #[error("Invalid package identifier: {0}")]
    InvalidCpv(String),

    /// EAPI this crate does not know the grammar of
    #[error("Unsupported EAPI: {0}")]
    UnsupportedEapi(String),

    /// Artifact cache directory that cannot be listed
    #[error("{} does not appear to be an accessible directory: {reason}", path.display())]
    InaccessibleDirectory { path: PathBuf, reason: String },

    /// Invalid exclusion pattern
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Semantically invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file that is not valid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
