//! Staged bucketing: cheap discriminators applied before byte comparison.
//!
//! # Overview
//!
//! A [`Discriminator`] maps a file to a key such that files with different
//! keys cannot have identical content. [`narrow`] splits one bucket of
//! candidates by key and drops every bucket left with a single file, since a
//! lone file cannot be part of a duplicate group.
//!
//! The duplicate finder chains stages in order of cost:
//!
//! 1. [`SizeDiscriminator`] - file length, read from metadata only
//! 2. [`PrehashDiscriminator`] - BLAKE3 of the first 4 KiB
//! 3. byte comparison (see [`crate::duplicates::baseline`])
//!
//! Each stage runs only inside the buckets that survived the previous one.
//! Equal keys are never taken as proof of equal content.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::{narrow, SizeDiscriminator};
//! use dupfind::scanner::FileEntry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/a.txt"), 100, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/b.txt"), 100, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/c.txt"), 200, SystemTime::now()),
//! ];
//!
//! let outcome = narrow(&SizeDiscriminator, files, None);
//!
//! assert_eq!(outcome.buckets.len(), 1);
//! assert_eq!(outcome.stats.eliminated_unique, 1);
//! ```

use std::collections::HashMap;
use std::hash::Hash as StdHash;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::scanner::{hash_to_hex, FileEntry, Hash, Hasher, ReadError};

/// A cheap, necessary-but-not-sufficient content equality screen.
///
/// Files whose keys differ must have different content. Files whose keys
/// match may or may not be equal.
pub trait Discriminator: Sync {
    /// Key type produced for each file.
    type Key: Eq + StdHash + Send;

    /// Stage name used in logs and statistics.
    fn name(&self) -> &'static str;

    /// Compute the key of a file.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the file cannot be inspected.
    fn key(&self, file: &FileEntry) -> Result<Self::Key, ReadError>;
}

/// Buckets files by their length in bytes.
///
/// Uses the size captured at enumeration; no file is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeDiscriminator;

impl Discriminator for SizeDiscriminator {
    type Key = u64;

    fn name(&self) -> &'static str {
        "size"
    }

    fn key(&self, file: &FileEntry) -> Result<u64, ReadError> {
        Ok(file.size)
    }
}

/// Buckets files by the BLAKE3 hash of their first bytes.
#[derive(Debug, Clone, Default)]
pub struct PrehashDiscriminator {
    hasher: Hasher,
}

impl PrehashDiscriminator {
    /// Create a prehash stage backed by `hasher`.
    #[must_use]
    pub fn new(hasher: Hasher) -> Self {
        Self { hasher }
    }
}

impl Discriminator for PrehashDiscriminator {
    type Key = Hash;

    fn name(&self) -> &'static str {
        "prehash"
    }

    fn key(&self, file: &FileEntry) -> Result<Hash, ReadError> {
        let hash = self.hasher.prehash(&file.path)?;
        log::trace!("prehash {} {}", hash_to_hex(&hash), file.path.display());
        Ok(hash)
    }
}

/// Statistics from one stage.
#[derive(Debug, Default)]
pub struct StageStats {
    /// Files that entered the stage
    pub input_files: usize,
    /// Files left in buckets of 2+ after the stage
    pub candidates: usize,
    /// Number of surviving buckets
    pub buckets: usize,
    /// Files dropped because their key was unique
    pub eliminated_unique: usize,
    /// Files dropped because their key could not be computed
    pub failed_files: usize,
    /// Errors for the failed files
    pub errors: Vec<ReadError>,
    /// Whether the stage stopped early on shutdown
    pub interrupted: bool,
}

impl StageStats {
    /// Percentage of input files eliminated by this stage.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.candidates;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }

    /// Fold the statistics of another run of the same stage into this one.
    pub fn merge(&mut self, other: StageStats) {
        self.input_files += other.input_files;
        self.candidates += other.candidates;
        self.buckets += other.buckets;
        self.eliminated_unique += other.eliminated_unique;
        self.failed_files += other.failed_files;
        self.errors.extend(other.errors);
        self.interrupted |= other.interrupted;
    }
}

/// Surviving buckets of a stage plus its statistics.
#[derive(Debug, Default)]
pub struct StageOutcome {
    /// Buckets with two or more files, in order of first appearance
    pub buckets: Vec<Vec<FileEntry>>,
    /// Statistics for this stage
    pub stats: StageStats,
}

/// Split `files` by discriminator key, keeping only buckets of 2+ files.
///
/// Bucket order follows the first appearance of each key in `files`, and
/// files keep their relative order within a bucket, so the result is
/// deterministic for a given input.
///
/// Files whose key cannot be computed are excluded with a warning and their
/// error is recorded. When `shutdown` is raised the stage stops and reports
/// `interrupted`; buckets built so far are discarded.
#[must_use]
pub fn narrow<D: Discriminator>(
    discriminator: &D,
    files: Vec<FileEntry>,
    shutdown: Option<&AtomicBool>,
) -> StageOutcome {
    let mut stats = StageStats {
        input_files: files.len(),
        ..Default::default()
    };

    let mut slots: HashMap<D::Key, usize> = HashMap::new();
    let mut buckets: Vec<Vec<FileEntry>> = Vec::new();

    for file in files {
        if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
            stats.interrupted = true;
            break;
        }

        match discriminator.key(&file) {
            Ok(key) => {
                let slot = *slots.entry(key).or_insert_with(|| {
                    buckets.push(Vec::new());
                    buckets.len() - 1
                });
                buckets[slot].push(file);
            }
            Err(e) if e.is_interrupted() => {
                stats.interrupted = true;
                break;
            }
            Err(e) => {
                log::warn!(
                    "Excluding {} from {} stage: {}",
                    file.path.display(),
                    discriminator.name(),
                    e
                );
                stats.failed_files += 1;
                stats.errors.push(e);
            }
        }
    }

    if stats.interrupted {
        log::debug!("{} stage interrupted by shutdown", discriminator.name());
        return StageOutcome {
            buckets: Vec::new(),
            stats,
        };
    }

    let buckets: Vec<Vec<FileEntry>> = buckets
        .into_iter()
        .filter(|bucket| {
            if bucket.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique {}: {}",
                    discriminator.name(),
                    bucket[0].path.display()
                );
                false
            } else {
                stats.candidates += bucket.len();
                true
            }
        })
        .collect();
    stats.buckets = buckets.len();

    StageOutcome { buckets, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn make_file(path: &str, size: u64) -> FileEntry {
        FileEntry::new(PathBuf::from(path), size, SystemTime::now())
    }

    fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> FileEntry {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        FileEntry::from_path(path).unwrap()
    }

    #[test]
    fn test_size_stage_empty_input() {
        let outcome = narrow(&SizeDiscriminator, Vec::new(), None);

        assert!(outcome.buckets.is_empty());
        assert_eq!(outcome.stats.input_files, 0);
        assert_eq!(outcome.stats.elimination_rate(), 0.0);
    }

    #[test]
    fn test_size_stage_all_unique() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 200),
            make_file("/c.txt", 300),
        ];
        let outcome = narrow(&SizeDiscriminator, files, None);

        assert!(outcome.buckets.is_empty());
        assert_eq!(outcome.stats.eliminated_unique, 3);
        assert_eq!(outcome.stats.candidates, 0);
        assert!((outcome.stats.elimination_rate() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_size_stage_multiple_buckets_keep_first_seen_order() {
        let files = vec![
            make_file("/b1.txt", 200),
            make_file("/a1.txt", 100),
            make_file("/b2.txt", 200),
            make_file("/c.txt", 300),
            make_file("/a2.txt", 100),
            make_file("/b3.txt", 200),
        ];
        let outcome = narrow(&SizeDiscriminator, files, None);

        assert_eq!(outcome.buckets.len(), 2);
        assert_eq!(outcome.buckets[0].len(), 3);
        assert_eq!(outcome.buckets[0][0].path, PathBuf::from("/b1.txt"));
        assert_eq!(outcome.buckets[1].len(), 2);
        assert_eq!(outcome.stats.buckets, 2);
        assert_eq!(outcome.stats.candidates, 5);
        assert_eq!(outcome.stats.eliminated_unique, 1);
    }

    #[test]
    fn test_size_stage_groups_empty_files() {
        let files = vec![make_file("/e1", 0), make_file("/e2", 0)];
        let outcome = narrow(&SizeDiscriminator, files, None);

        assert_eq!(outcome.buckets.len(), 1);
        assert_eq!(outcome.buckets[0].len(), 2);
    }

    #[test]
    fn test_size_stage_never_mixes_sizes() {
        let files: Vec<FileEntry> = (0..1000)
            .map(|i| make_file(&format!("/file{}", i), (i % 37) as u64))
            .collect();
        let outcome = narrow(&SizeDiscriminator, files, None);

        for bucket in &outcome.buckets {
            assert!(bucket.len() >= 2);
            assert!(bucket.iter().all(|f| f.size == bucket[0].size));
        }
        assert_eq!(outcome.stats.candidates, 1000);
    }

    #[test]
    fn test_size_stage_shutdown() {
        let files = vec![make_file("/a", 1), make_file("/b", 1)];
        let flag = AtomicBool::new(true);
        let outcome = narrow(&SizeDiscriminator, files, Some(&flag));

        assert!(outcome.stats.interrupted);
        assert!(outcome.buckets.is_empty());
    }

    #[test]
    fn test_prehash_stage_splits_same_size() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            create_test_file(&dir, "dup1.txt", b"duplicate content"),
            create_test_file(&dir, "dup2.txt", b"duplicate content"),
            create_test_file(&dir, "other.txt", b"different content"),
        ];

        let stage = PrehashDiscriminator::new(Hasher::new());
        let outcome = narrow(&stage, files, None);

        assert_eq!(outcome.buckets.len(), 1);
        assert_eq!(outcome.buckets[0].len(), 2);
        assert_eq!(outcome.stats.eliminated_unique, 1);
    }

    #[test]
    fn test_prehash_stage_excludes_unreadable() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            create_test_file(&dir, "exists.txt", b"real content"),
            make_file(dir.path().join("missing.txt").to_str().unwrap(), 12),
        ];

        let stage = PrehashDiscriminator::new(Hasher::new());
        let outcome = narrow(&stage, files, None);

        assert!(outcome.buckets.is_empty());
        assert_eq!(outcome.stats.failed_files, 1);
        assert_eq!(outcome.stats.eliminated_unique, 1);
        assert!(matches!(outcome.stats.errors[0], ReadError::NotFound(_)));
    }

    #[test]
    fn test_stage_stats_merge() {
        let mut total = StageStats {
            input_files: 4,
            candidates: 2,
            buckets: 1,
            eliminated_unique: 2,
            ..Default::default()
        };
        total.merge(StageStats {
            input_files: 3,
            candidates: 3,
            buckets: 1,
            failed_files: 0,
            interrupted: true,
            ..Default::default()
        });

        assert_eq!(total.input_files, 7);
        assert_eq!(total.candidates, 5);
        assert_eq!(total.buckets, 2);
        assert_eq!(total.eliminated_unique, 2);
        assert!(total.interrupted);
    }
}
