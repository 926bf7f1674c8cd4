//! Sandbox staging — isolated working copies of package directories.
//!
//! Every build-target invocation runs inside its own staged copy so
//! package scripts can scribble freely without touching the installed
//! tree, and so no two invocations ever share a working directory.

use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::domain::StagingError;

/// An exclusive working copy of a package directory.
///
/// The backing temporary directory is deleted when the handle is dropped,
/// so cleanup runs on every exit path, including panics.
/// Call [`StagedDir::release`] to surface deletion errors instead of
/// discarding them.
#[derive(Debug)]
pub struct StagedDir {
    temp: TempDir,
}

impl StagedDir {
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Recursively delete the staged directory now.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub fn release(self) -> Result<()> {
        self.temp.close().context("releasing staged directory")
    }
}

/// Copy `source_dir`'s full contents into a freshly created exclusive
/// temporary directory.
///
/// # Errors
///
/// Returns [`StagingError::SourceMissing`] if `source_dir` does not exist,
/// or an I/O error if the copy fails.
pub fn stage(source_dir: &Path) -> Result<StagedDir> {
    if !source_dir.exists() {
        return Err(StagingError::SourceMissing(source_dir.to_path_buf()).into());
    }
    let temp = TempDir::new().context("creating staging directory")?;
    copy_tree(source_dir, temp.path())
        .with_context(|| format!("staging {}", source_dir.display()))?;
    tracing::debug!(source = %source_dir.display(), staged = %temp.path().display(), "staged package copy");
    Ok(StagedDir { temp })
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in std::fs::read_dir(from).with_context(|| format!("reading {}", from.display()))? {
        let entry = entry.context("reading directory entry")?;
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().context("reading entry type")?;
        if file_type.is_dir() {
            std::fs::create_dir(&target)
                .with_context(|| format!("creating {}", target.display()))?;
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("copying to {}", target.display()))?;
        }
    }
    Ok(())
}
