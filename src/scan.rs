//! Source tree discovery.
//!
//! Walks the source root and turns every regular file into an [`Asset`].
//! Nothing here decides what to do with a file; see [`crate::classify`].
//!
//! ```text
//! public/images/               # Source root
//! ├── hero.png                 # → Asset { relative_path: "hero.png", extension: ".png" }
//! ├── logo.svg
//! └── blog/
//!     └── 2024/
//!         └── Cover.JPG        # → Asset { relative_path: "blog/2024/Cover.JPG", extension: ".jpg" }
//! ```

use crate::classify::extension_of;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// An entry below the root that could not be followed: a dangling symlink,
/// a symlink loop, or an unreadable subdirectory.
#[derive(Error, Debug)]
#[error("unreadable entry: {source}")]
pub struct EntryError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Absolute (or root-joined) path of the source file.
    pub source_path: PathBuf,
    /// Path relative to the source root.
    pub relative_path: PathBuf,
    /// Lower-cased extension with leading dot, `""` if none.
    pub extension: String,
    pub size: u64,
    pub modified: SystemTime,
}

impl Asset {
    /// Stat `path` and describe it relative to `root`.
    pub fn from_path(root: &Path, path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        let relative_path = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not under {}", path.display(), root.display()),
                )
            })?;
        Ok(Self {
            source_path: path.to_path_buf(),
            extension: extension_of(path),
            relative_path,
            size: meta.len(),
            modified: meta.modified()?,
        })
    }
}

/// List every regular file at any depth under `root`.
///
/// Symlinks are followed. Order is directory-entry order and not otherwise
/// specified. A missing root is [`ScanError::NotFound`]; callers that treat
/// absence as "nothing to do" should check first.
///
/// Only a failure on the root itself is fatal. Entries below it that cannot
/// be followed come back as [`EntryError`]s in place, so one bad link costs
/// one asset.
pub fn walk(root: &Path) -> Result<Vec<Result<PathBuf, EntryError>>, ScanError> {
    if !root.exists() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    entries.push(Ok(entry.into_path()));
                }
            }
            Err(err) => match err.path().map(Path::to_path_buf) {
                Some(path) if err.depth() > 0 => entries.push(Err(EntryError {
                    path,
                    source: err.into(),
                })),
                _ => return Err(err.into()),
            },
        }
    }
    Ok(entries)
}
