//! Handle on the downloaded IANA Language Subtag Registry file.
//!
//! The file is opened up front so a bad path fails before any database work
//! starts. Its records are not interpreted here.

use crate::{DbL10nError, Result};
use std::path::{Path, PathBuf};

/// An opened, readable registry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySource {
    path: PathBuf,
    size: u64,
}

impl RegistrySource {
    /// Opens the registry file for reading and records its size.
    ///
    /// # Errors
    /// Returns an I/O error naming the path if the file cannot be opened, or
    /// a configuration error if the path is not a regular file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            DbL10nError::io(format!("Failed to open registry file {}", path.display()), e)
        })?;
        let metadata = file.metadata().await.map_err(|e| {
            DbL10nError::io(format!("Failed to stat registry file {}", path.display()), e)
        })?;

        if !metadata.is_file() {
            return Err(DbL10nError::configuration(format!(
                "Registry path {} is not a regular file",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    /// Path the registry was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes at the time it was opened.
    pub const fn size(&self) -> u64 {
        self.size
    }
}
