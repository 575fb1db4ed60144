//! Relocation Executor
//!
//! Moves a note into its resolved destination directory, keeping the file
//! name. Destinations only come from [`ResolvedDestination`], never from raw
//! classifier output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::resolve::ResolvedDestination;
use crate::vault::Vault;

/// Preview prints the plan; apply mutates the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Apply,
    Preview,
}

/// Where one source file is going
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub source: PathBuf,
    pub destination_dir: PathBuf,
    pub target: PathBuf,
}

impl MovePlan {
    pub fn new(source: &Path, destination: &ResolvedDestination, vault: &Vault) -> Result<Self> {
        let file_name = source
            .file_name()
            .ok_or_else(|| CatalogError::InvalidSource {
                path: source.to_path_buf(),
            })?;
        let destination_dir = vault.join(destination)?;
        let target = destination_dir.join(file_name);

        Ok(Self {
            source: source.to_path_buf(),
            destination_dir,
            target,
        })
    }

    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// `<file name> => <absolute destination dir>`
    pub fn preview_line(&self) -> String {
        format!("{} => {}", self.file_name(), self.destination_dir.display())
    }
}

/// What `execute` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// An existing file with the same name was overwritten
    Replaced,
    /// Source already sits at the target path
    AlreadyInPlace,
}

/// Applies move plans
#[derive(Debug, Clone, Copy, Default)]
pub struct Relocator {
    /// Replace an existing file of the same name instead of refusing
    pub overwrite: bool,
}

impl Relocator {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Create the destination directory and move the file into it.
    ///
    /// A directory created for a move that then fails is left in place.
    pub fn execute(&self, plan: &MovePlan) -> Result<MoveOutcome> {
        if !plan.source.is_file() {
            return Err(CatalogError::SourceNotFound {
                path: plan.source.clone(),
            });
        }

        if plan.target.exists() && same_file(&plan.source, &plan.target) {
            return Ok(MoveOutcome::AlreadyInPlace);
        }

        fs::create_dir_all(&plan.destination_dir).map_err(|source| CatalogError::CreateDir {
            path: plan.destination_dir.clone(),
            source,
        })?;

        let replacing = plan.target.exists();
        if replacing && !self.overwrite {
            return Err(CatalogError::DestinationExists {
                path: plan.target.clone(),
            });
        }

        move_file(&plan.source, &plan.target)?;

        Ok(if replacing {
            MoveOutcome::Replaced
        } else {
            MoveOutcome::Moved
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Rename, falling back to copy + remove (e.g. across filesystems)
fn move_file(source: &Path, target: &Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    let to_move_error = |source_err| CatalogError::Move {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: source_err,
    };

    fs::copy(source, target).map_err(to_move_error)?;
    fs::remove_file(source).map_err(|e| {
        to_move_error(io::Error::new(
            e.kind(),
            format!("target was written but the source could not be removed: {}", e),
        ))
    })
}
