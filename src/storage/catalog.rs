//! The catalog: base name -> every absolute path carrying that name.
//!
//! `IndexStore` owns the current catalog and its on-disk record. Nothing is
//! written back until `save()` is called.

use crate::error::Result;
use crate::storage::record::{read_record, write_record};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Reserved "no match" marker. Always present as `"none" -> ["none"]`.
pub const SENTINEL: &str = "none";

const RECORD_KIND: &str = "catalog";
const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog holding only the sentinel entry.
    pub fn new() -> Self {
        let mut catalog = Self { entries: BTreeMap::new() };
        catalog.seal();
        catalog
    }

    /// Append `path` to the list for `name`, creating the key if needed.
    pub fn push_path(&mut self, name: &str, path: String) {
        if let Some(paths) = self.entries.get_mut(name) {
            paths.push(path);
        } else {
            self.entries.insert(name.to_string(), vec![path]);
        }
    }

    /// (Re)write the sentinel entry. Called last by the crawler, so an item
    /// literally named "none" does not survive as a real entry.
    pub fn seal(&mut self) {
        self.entries.insert(SENTINEL.to_string(), vec![SENTINEL.to_string()]);
    }

    /// Paths recorded for `name`, or the sentinel sequence when absent.
    pub fn paths_for(&self, name: &str) -> &[String] {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(SENTINEL))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn unique_names(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of keys, sentinel included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when only the sentinel is present.
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn path_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(name, _)| name.as_str() != SENTINEL)
            .map(|(_, paths)| paths.len())
            .sum()
    }
}

pub struct IndexStore {
    path: PathBuf,
    catalog: Catalog,
}

impl IndexStore {
    /// A store with an empty catalog that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), catalog: Catalog::new() }
    }

    /// Load the catalog at `path`. A missing file yields an empty catalog.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let catalog = match read_record::<Catalog>(&path, RECORD_KIND, RECORD_VERSION)? {
            Some(mut catalog) => {
                catalog.seal();
                tracing::info!("[IndexStore] Loaded {} names from {}", catalog.len(), path.display());
                catalog
            }
            None => {
                tracing::warn!("[IndexStore] No catalog at {}. Fetch all files first.", path.display());
                Catalog::new()
            }
        };
        Ok(Self { path, catalog })
    }

    pub fn save(&self) -> Result<()> {
        write_record(&self.path, RECORD_KIND, RECORD_VERSION, &self.catalog)?;
        tracing::info!("[IndexStore] Saved {} names to {}", self.catalog.len(), self.path.display());
        Ok(())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replace the in-memory catalog wholesale. Not persisted until `save()`.
    pub fn replace(&mut self, mut catalog: Catalog) -> Catalog {
        catalog.seal();
        std::mem::replace(&mut self.catalog, catalog)
    }

    pub fn paths_for(&self, name: &str) -> &[String] {
        self.catalog.paths_for(name)
    }

    pub fn unique_names(&self) -> BTreeSet<String> {
        self.catalog.unique_names()
    }
}
