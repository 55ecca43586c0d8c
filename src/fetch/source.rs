//! Serve Root
//!
//! Resolves requested names to files under the configured directory.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, File};

use crate::error::{Result, ServeError};

/// Size and kind of a file under the serve root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub is_dir: bool,
}

// == Serve Root ==
/// Directory that requested names are resolved against.
#[derive(Debug, Clone)]
pub struct ServeRoot {
    root: PathBuf,
}

impl ServeRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // == Resolve ==
    /// Maps `name` to a path inside the root.
    ///
    /// Only plain relative components are accepted; `..`, absolute paths and
    /// empty names are rejected before the filesystem is touched.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(ServeError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }

    // == Stat ==
    pub async fn stat(&self, name: &str) -> Result<FileInfo> {
        let path = self.resolve(name)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))?;
        Ok(FileInfo {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        })
    }

    // == Open ==
    /// Opens `name` for streaming and returns it with its length.
    ///
    /// Directories are never opened.
    pub async fn open(&self, name: &str) -> Result<(File, u64)> {
        let info = self.stat(name).await?;
        if info.is_dir {
            return Err(ServeError::IsDirectory(name.to_string()));
        }
        let file = File::open(self.resolve(name)?)
            .await
            .map_err(|e| not_found_or_io(name, e))?;
        Ok((file, info.size))
    }
}

fn not_found_or_io(name: &str, e: std::io::Error) -> ServeError {
    if e.kind() == ErrorKind::NotFound {
        ServeError::NotFound(name.to_string())
    } else {
        ServeError::Io(e)
    }
}
