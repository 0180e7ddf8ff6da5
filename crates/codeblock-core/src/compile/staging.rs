//! Throwaway project directories for one compilation each.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Error, Result};

use super::language::EntryExtension;

/// Directory name of the bundler output inside a staging area.
pub const OUTPUT_DIR: &str = "dist";

/// File name of the emitted bundle.
pub const BUNDLE_FILE: &str = "bundle.js";

/// A uniquely named directory holding one compilation's input and output.
///
/// The name comes from the OS-backed random temp-name generator, so
/// concurrent compilations never share a directory. [`close`](Self::close)
/// removes it and reports failures; dropping it without closing (for example
/// when the compile future is abandoned) still removes it, silently.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Prefix of every staging directory name.
    pub const PREFIX: &'static str = "codeblock-";

    /// Create a fresh staging directory inside `parent`.
    ///
    /// Runs on the blocking pool.
    pub async fn create(parent: &Path) -> Result<Self> {
        let parent = parent.to_path_buf();
        let task_parent = parent.clone();
        tokio::task::spawn_blocking(move || Self::create_blocking(&task_parent))
            .await
            .unwrap_or_else(|e| {
                Err(Error::Staging {
                    path: parent,
                    source: io::Error::other(e),
                })
            })
    }

    fn create_blocking(parent: &Path) -> Result<Self> {
        let staging_error = |source| Error::Staging {
            path: parent.to_path_buf(),
            source,
        };

        let parent = fs::canonicalize(parent).map_err(staging_error)?;
        let dir = tempfile::Builder::new()
            .prefix(Self::PREFIX)
            .tempdir_in(&parent)
            .map_err(staging_error)?;

        tracing::debug!("Created staging area {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Absolute path of the staging directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the entry source file and return its path.
    pub async fn write_entry(&self, extension: &EntryExtension, source: &str) -> Result<PathBuf> {
        let path = self.path().join(extension.entry_file_name());
        tokio::fs::write(&path, source)
            .await
            .map_err(|source| Error::Staging {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Directory the bundler writes into.
    pub fn output_dir(&self) -> PathBuf {
        self.path().join(OUTPUT_DIR)
    }

    /// Expected path of the emitted bundle.
    pub fn bundle_path(&self) -> PathBuf {
        self.output_dir().join(BUNDLE_FILE)
    }

    /// Recursively remove the staging directory.
    ///
    /// Runs on the blocking pool.
    pub async fn close(self) -> Result<()> {
        let path = self.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || self.dir.close())
            .await
            .unwrap_or_else(|e| Err(io::Error::other(e)));

        result.map_err(|source| Error::Cleanup {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Removed staging area {}", path.display());
        Ok(())
    }
}
