//! Category Table
//!
//! Runtime lookup table built once from the config and read-only afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::paths::escapes_root;

/// One taxonomy entry from the config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Vault-relative base directory
    pub path: String,
    /// Leaf folder names under `path`, in listed order
    pub subcategories: Vec<String>,
}

/// Record of a subcategory key that was overwritten by a later entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub replaced: String,
    pub kept: String,
}

/// Normalized lookup key for a subcategory name
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// `base/name` with `/` as separator, regardless of platform
pub fn join_destination(base: &str, name: &str) -> String {
    let base = base.trim_end_matches(['/', '\\']);
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Normalized subcategory key → vault-relative destination, plus the
/// fallback used when nothing matches
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
    collisions: Vec<KeyCollision>,
    fallback: String,
}

impl CategoryTable {
    /// Flatten the taxonomy.
    ///
    /// When two subcategories normalize to the same key the one listed last
    /// wins. The overwrite is recorded in [`CategoryTable::collisions`] rather
    /// than rejected. Every destination, `fallback` included, must stay inside
    /// the vault.
    pub fn build(categories: &[CategoryEntry], fallback: &str) -> Result<Self> {
        let fallback = fallback.trim();
        if fallback.is_empty() || escapes_root(fallback) {
            return Err(unsafe_destination("default_path", fallback));
        }

        let mut table = Self {
            entries: Vec::new(),
            index: HashMap::new(),
            collisions: Vec::new(),
            fallback: fallback.to_string(),
        };
        for category in categories {
            for name in &category.subcategories {
                let destination = join_destination(&category.path, name);
                if name.trim().is_empty() || escapes_root(&destination) {
                    return Err(unsafe_destination("category", &destination));
                }
                table.insert(normalize_key(name), destination);
            }
        }
        Ok(table)
    }

    /// Destination used when an answer matches nothing
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    fn insert(&mut self, key: String, destination: String) {
        match self.index.get(&key) {
            Some(&pos) => {
                let replaced = std::mem::replace(&mut self.entries[pos].1, destination.clone());
                if replaced != destination {
                    self.collisions.push(KeyCollision {
                        key,
                        replaced,
                        kept: destination,
                    });
                }
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, destination));
            }
        }
    }

    /// Destination for an already-normalized key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn contains_destination(&self, destination: &str) -> bool {
        self.entries.iter().any(|(_, d)| d == destination)
    }

    /// Candidate destinations in config order
    pub fn destinations(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, d)| d.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d.as_str()))
    }

    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unsafe_destination(field: &str, value: &str) -> CatalogError {
    CatalogError::InvalidConfig {
        message: format!("{} {:?} is not a vault-relative path", field, value),
    }
}
