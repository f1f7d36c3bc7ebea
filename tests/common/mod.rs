// tests/common/mod.rs

//! Shared fixtures for integration tests.
//!
//! A `Fixture` lays out a miniature system inside a temporary directory:
//! a distfiles directory, a binary package directory, a repository with an
//! md5-cache and an installed package database.

#![allow(dead_code)]

use eclean::catalog::{Md5CacheRepo, PackagesIndex, VdbStore};
use eclean::Cpv;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Fixture {
    // Keep the TempDir alive to prevent cleanup
    temp: TempDir,
    pub distdir: PathBuf,
    pub pkgdir: PathBuf,
    pub repo_dir: PathBuf,
    pub vdb_dir: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        let fixture = Self {
            distdir: root.join("distfiles"),
            pkgdir: root.join("binpkgs"),
            repo_dir: root.join("repos/gentoo"),
            vdb_dir: root.join("vdb"),
            temp,
        };
        for dir in [&fixture.distdir, &fixture.pkgdir, &fixture.repo_dir, &fixture.vdb_dir] {
            fs::create_dir_all(dir).unwrap();
        }
        fixture
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Create a distfile of `size` bytes modified at `mtime` (unix seconds)
    pub fn distfile(&self, name: &str, size: usize, mtime: i64) -> PathBuf {
        let path = self.distdir.join(name);
        fs::write(&path, vec![0u8; size]).unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
        path
    }

    /// Add an ebuild to the repository md5-cache
    pub fn ebuild(&self, cpv: &str, keys: &[(&str, &str)]) {
        let cpv = Cpv::parse(cpv).unwrap();
        let dir = self.repo_dir.join("metadata/md5-cache").join(cpv.category());
        fs::create_dir_all(&dir).unwrap();
        let content: String = keys.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect();
        fs::write(dir.join(cpv.pf()), content).unwrap();
    }

    /// Add a package to the installed package database
    pub fn install(&self, cpv: &str, keys: &[(&str, &str)]) {
        let cpv = Cpv::parse(cpv).unwrap();
        let dir = self.vdb_dir.join(cpv.category()).join(cpv.pf());
        fs::create_dir_all(&dir).unwrap();
        for (key, value) in keys {
            fs::write(dir.join(key), format!("{}\n", value)).unwrap();
        }
    }

    /// Write the binary package index and create the files it lists
    pub fn packages_index(&self, stanzas: &[&[(&str, &str)]]) {
        let mut content = String::from("ARCH: amd64\nVERSION: 0\n");
        for stanza in stanzas {
            content.push('\n');
            for (key, value) in *stanza {
                content.push_str(&format!("{}: {}\n", key, value));
                if *key == "PATH" {
                    let path = self.pkgdir.join(value);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(&path, b"binpkg").unwrap();
                }
            }
        }
        fs::write(self.pkgdir.join("Packages"), content).unwrap();
    }

    pub fn repo(&self) -> Md5CacheRepo {
        Md5CacheRepo::new([&self.repo_dir])
    }

    pub fn vdb(&self) -> VdbStore {
        VdbStore::new(&self.vdb_dir)
    }

    pub fn binaries(&self) -> PackagesIndex {
        PackagesIndex::open(&self.pkgdir).unwrap()
    }
}

pub fn cpv(s: &str) -> Cpv {
    Cpv::parse(s).unwrap()
}

pub fn names<V>(map: &std::collections::BTreeMap<String, V>) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}
