//! Scanner module for directory traversal and file content access.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Prehashing file heads with BLAKE3
//! - Exact byte-for-byte content comparison
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 prehash of the first bytes of a file
//! - [`compare`]: The content equality predicate used to confirm duplicates
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod compare;
pub mod hasher;
pub mod walker;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use compare::{ByteComparer, ContentEq};
pub use hasher::{hash_to_hex, Hash, Hasher, PREHASH_SIZE};
pub use walker::Walker;

/// A regular file discovered by the walker.
///
/// Entries are immutable once enumerated. The size is captured from metadata
/// at enumeration time and is what the size stage buckets on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Whether this file was reached through a symbolic link
    pub is_symlink: bool,
}

impl FileEntry {
    /// Create a new FileEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            is_symlink: false,
        }
    }

    /// Build an entry by reading the metadata of `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the metadata cannot be read.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ReadError> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).map_err(|e| ReadError::from_io(&path, e))?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Ok(Self::new(path, metadata.len(), modified))
    }
}

/// Configuration for directory walking.
///
/// Controls filtering, symlink handling, and other walk behavior.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    /// `.gitignore` files found in the tree are not consulted.
    pub ignore_patterns: Vec<String>,
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while reading file content.
///
/// A read error makes the affected file non-matching: it is dropped from every
/// group rather than failing the whole run (unless strict mode is enabled).
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file disappeared after enumeration.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading was abandoned because shutdown was requested.
    #[error("Read interrupted: {0}")]
    Interrupted(PathBuf),
}

impl ReadError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The file the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) | Self::Interrupted(path) => path,
            Self::Io { path, .. } => path,
        }
    }

    /// Whether this error comes from cancellation rather than the file itself.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}
