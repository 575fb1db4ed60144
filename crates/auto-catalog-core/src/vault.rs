//! Vault root discovery
//!
//! A vault is the directory that contains the `.obsidian` marker directory.
//! Every destination path in the config is relative to it.

use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::paths::normalize_lexically;
use crate::resolve::ResolvedDestination;

/// Marker directory identifying the vault root
pub const VAULT_MARKER: &str = ".obsidian";

/// Default config file name inside the marker directory
pub const CONFIG_FILE: &str = "auto-catalog.json";

/// Walk upward from `start` until a directory containing [`VAULT_MARKER`] is found.
///
/// Relative paths are resolved against the current directory and `.`/`..`
/// components are folded lexically first, so the walk always ends at the
/// filesystem root. Symlinks are not resolved.
pub fn find_vault_root(start: &Path) -> Option<PathBuf> {
    let absolute = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(start)
    };
    let mut current = normalize_lexically(&absolute);
    if current.is_file() {
        current.pop();
    }

    current
        .ancestors()
        .find(|dir| dir.join(VAULT_MARKER).is_dir())
        .map(Path::to_path_buf)
}

/// The managed root all destinations are anchored to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Locate the vault above `start`; failing to find one is fatal for a run
    pub fn locate(start: &Path) -> Result<Self> {
        find_vault_root(start)
            .map(|root| Self { root })
            .ok_or_else(|| CatalogError::VaultNotFound {
                start: start.to_path_buf(),
            })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn marker_dir(&self) -> PathBuf {
        self.root.join(VAULT_MARKER)
    }

    pub fn default_config_path(&self) -> PathBuf {
        self.marker_dir().join(CONFIG_FILE)
    }

    /// Absolute directory for a resolved destination.
    ///
    /// Refuses `..` segments so the result always stays under the root.
    pub fn join(&self, destination: &ResolvedDestination) -> Result<PathBuf> {
        let mut dir = self.root.clone();
        for segment in destination.as_str().split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(CatalogError::UnsafeDestination {
                        destination: destination.to_string(),
                    })
                }
                segment => dir.push(segment),
            }
        }
        Ok(dir)
    }
}
