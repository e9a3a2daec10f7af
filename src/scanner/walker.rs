//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, the file enumerator of the
//! pipeline. It walks a directory tree and yields one [`FileEntry`] per
//! regular file, in a deterministic (name-sorted, depth-first) order.
//!
//! # Features
//!
//! - Parallel directory reading using jwalk's rayon pool
//! - Optional symlink following; a file reached through several links is
//!   listed once, under the first path in walk order
//! - Gitignore-style ignore patterns via the `ignore` crate (explicit
//!   patterns only; `.gitignore` files are not read)
//! - Size filtering (min/max)
//! - Hidden file filtering
//! - Graceful shutdown via atomic flag
//!
//! Empty files are yielded like any other file: two empty files have identical
//! content. Use a `min_size` of 1 to leave them out.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: Some(1024),
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("/home/user/Pictures"), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for parallel file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback, notified once per yielded file
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the gitignore-style matcher for the configured ignore patterns.
    ///
    /// Only explicit patterns are used; `.gitignore` files in the tree are
    /// ordinary files to the walker.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }
        let mut builder = GitignoreBuilder::new(&self.root);

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a file is ignored, either directly or through a parent directory.
    fn should_ignore(&self, path: &Path, gitignore: &Option<Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        gi.matched_path_or_any_parents(relative_path, false)
            .is_ignore()
    }

    fn passes_size_filter(&self, size: u64) -> bool {
        if self.config.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.config.max_size.is_some_and(|max| size > max) {
            return false;
        }
        true
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. The root itself is not validated here; see
    /// [`crate::duplicates::DuplicateFinder::enumerate`].
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let mut yielded = 0usize;
        let mut seen_targets: HashSet<PathBuf> = HashSet::new();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            let result = match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    if path == self.root {
                        return None;
                    }

                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }

                    if self.should_ignore(&path, &gitignore) {
                        log::trace!("Ignoring file: {}", path.display());
                        return None;
                    }

                    let is_symlink = entry.path_is_symlink();
                    if is_symlink && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    let metadata = if self.config.follow_symlinks {
                        std::fs::metadata(&path)
                    } else {
                        std::fs::symlink_metadata(&path)
                    };
                    let metadata = match metadata {
                        Ok(m) => m,
                        Err(e) => return Some(self.handle_io_error(&path, e)),
                    };

                    // Sockets, fifos, devices and dangling links are not candidates
                    if !metadata.is_file() {
                        return None;
                    }

                    let size = metadata.len();
                    if !self.passes_size_filter(size) {
                        log::trace!(
                            "Skipping file due to size filter ({}): {}",
                            size,
                            path.display()
                        );
                        return None;
                    }

                    // A followed link and its target are one file, listed once
                    if self.config.follow_symlinks {
                        let target = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                        if !seen_targets.insert(target) {
                            log::debug!("Skipping already listed file: {}", path.display());
                            return None;
                        }
                    }

                    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    Ok(FileEntry {
                        path,
                        size,
                        modified,
                        is_symlink,
                    })
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    self.handle_jwalk_error(path, e)
                }
            };

            if let (Ok(file), Some(callback)) = (&result, &self.progress_callback) {
                yielded += 1;
                callback.on_progress(yielded, file.path.to_string_lossy().as_ref());
            }
            Some(result)
        })
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> Result<FileEntry, ScanError> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path.to_path_buf()))
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                Err(ScanError::NotFound(path.to_path_buf()))
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Err(ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(
        &self,
        path: PathBuf,
        error: jwalk::Error,
    ) -> Result<FileEntry, ScanError> {
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => Err(ScanError::PermissionDenied(path)),
            Some(std::io::ErrorKind::NotFound) => Err(ScanError::NotFound(path)),
            _ => Err(ScanError::Io {
                path,
                source: std::io::Error::other(error.to_string()),
            }),
        }
    }
}
