// src/catalog/memory.rs

//! In-memory package stores

use super::{AuxKey, BinaryPackage, BinaryStore, PackageStore};
use crate::cpv::Cpv;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

type Attributes = HashMap<AuxKey, String>;

fn lookup(attrs: &Attributes, keys: &[AuxKey]) -> Vec<String> {
    keys.iter()
        .map(|key| attrs.get(key).cloned().unwrap_or_default())
        .collect()
}

/// A package store held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    packages: BTreeMap<Cpv, Attributes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a package
    pub fn insert(&mut self, cpv: Cpv, attributes: HashMap<AuxKey, String>) {
        self.packages.insert(cpv, attributes);
    }

    /// Builder form of [`MemoryStore::insert`]
    pub fn with_package<'a>(
        mut self,
        cpv: Cpv,
        attributes: impl IntoIterator<Item = (AuxKey, &'a str)>,
    ) -> Self {
        let attributes = attributes
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        self.insert(cpv, attributes);
        self
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageStore for MemoryStore {
    fn attributes(&self, cpv: &Cpv, keys: &[AuxKey]) -> Result<Vec<String>> {
        self.packages
            .get(cpv)
            .map(|attrs| lookup(attrs, keys))
            .ok_or_else(|| Error::NotFound(cpv.to_string()))
    }

    fn all_identifiers(&self) -> Result<BTreeSet<Cpv>> {
        Ok(self.packages.keys().cloned().collect())
    }

    fn cpv_exists(&self, cpv: &Cpv) -> bool {
        self.packages.contains_key(cpv)
    }
}

/// A binary package store held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryBinaryStore {
    packages: Vec<(BinaryPackage, Attributes)>,
}

impl MemoryBinaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binary package record; records keep insertion order
    pub fn insert(&mut self, package: BinaryPackage, attributes: HashMap<AuxKey, String>) {
        self.packages.push((package, attributes));
    }

    /// Builder form of [`MemoryBinaryStore::insert`]
    pub fn with_package<'a>(
        mut self,
        package: BinaryPackage,
        attributes: impl IntoIterator<Item = (AuxKey, &'a str)>,
    ) -> Self {
        let attributes = attributes
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        self.insert(package, attributes);
        self
    }
}

impl BinaryStore for MemoryBinaryStore {
    fn packages(&self) -> Result<Vec<BinaryPackage>> {
        Ok(self.packages.iter().map(|(pkg, _)| pkg.clone()).collect())
    }

    fn attributes(&self, package: &BinaryPackage, keys: &[AuxKey]) -> Result<Vec<String>> {
        self.packages
            .iter()
            .find(|(pkg, _)| pkg == package)
            .map(|(_, attrs)| lookup(attrs, keys))
            .ok_or_else(|| Error::NotFound(package.cpv.to_string()))
    }
}
