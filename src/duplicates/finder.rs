//! Duplicate finder implementation with staged detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk** - Collect all regular files under the root
//! 2. **Phase 1 - Size**: Bucket files by size (see [`crate::duplicates::stages`])
//! 3. **Phase 2 - Prehash**: Split each size bucket by a hash of its first 4 KiB
//! 4. **Phase 3 - Compare**: Pivot grouping by exact byte comparison inside
//!    each surviving bucket (see [`crate::duplicates::baseline`])
//!
//! Phases 2 and 3 run per size bucket on a bounded rayon pool. Buckets share
//! no state; their results are merged once every bucket has finished.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(2));
//! let (groups, summary) = finder.find_duplicates(Path::new("images")).unwrap();
//!
//! println!(
//!     "{} groups, {} reclaimable",
//!     groups.len(),
//!     summary.reclaimable_display()
//! );
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::baseline::{self, BaselineStats};
use super::stages::{narrow, PrehashDiscriminator, SizeDiscriminator, StageStats};
use super::{DuplicateGroup, GroupCollection};
use crate::progress::ProgressCallback;
use crate::scanner::{
    ByteComparer, FileEntry, Hasher, ReadError, ScanError, Walker, WalkerConfig,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads used for the content phases.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Run the prehash stage before byte comparison.
    pub prehash: bool,
    /// Fail on the first walk or read error instead of skipping the file.
    pub strict: bool,
    /// Directory walking options.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("prehash", &self.prehash)
            .field("strict", &self.strict)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            prehash: true,
            strict: false,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of I/O threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Enable or disable the prehash stage.
    #[must_use]
    pub fn with_prehash(mut self, enabled: bool) -> Self {
        self.prehash = enabled;
        self
    }

    /// Enable strict mode (fail on the first error).
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
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

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary of a complete duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Files that entered grouping
    pub total_files: usize,
    /// Combined size of those files in bytes
    pub total_size: u64,
    /// Files eliminated because their size was unique
    pub eliminated_by_size: usize,
    /// Files eliminated because their prehash was unique
    pub eliminated_by_prehash: usize,
    /// Byte comparisons performed
    pub comparisons: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Number of files that are copies of a representative
    pub duplicate_files: usize,
    /// Space recovered by keeping one file per group
    pub reclaimable_space: u64,
    /// Wall time of the scan
    pub scan_duration: Duration,
    /// Entries the walker could not visit
    pub scan_errors: Vec<ScanError>,
    /// Files excluded because their content could not be read
    pub read_errors: Vec<ReadError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }

    /// Whether any file was skipped because of an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty() || !self.read_errors.is_empty()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A walk error in strict mode.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A read error in strict mode.
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Result of the content phases for one size bucket.
#[derive(Debug, Default)]
struct BucketResult {
    groups: Vec<DuplicateGroup>,
    prehash: StageStats,
    compare: BaselineStats,
}

/// Duplicate finder that orchestrates the staged detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dupfind::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_io_threads(4);
/// let finder = DuplicateFinder::new(config);
///
/// let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate groups", summary.duplicate_groups);
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    comparer: ByteComparer,
    prehash: PrehashDiscriminator,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        let mut comparer = ByteComparer::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
            comparer = comparer.with_shutdown_flag(flag.clone());
        }

        Self {
            config,
            comparer,
            prehash: PrehashDiscriminator::new(hasher),
        }
    }

    /// Create a duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn shutdown(&self) -> Option<&AtomicBool> {
        self.config.shutdown_flag.as_deref()
    }

    /// Enumerate the regular files under `path`.
    ///
    /// Returns the files in walk order together with the walk errors that were
    /// skipped.
    ///
    /// # Errors
    ///
    /// - [`FinderError::PathNotFound`] / [`FinderError::NotADirectory`] for a bad root
    /// - [`FinderError::Scan`] for the first walk error in strict mode
    /// - [`FinderError::Interrupted`] if shutdown was requested
    pub fn enumerate(&self, path: &Path) -> Result<(Vec<FileEntry>, Vec<ScanError>), FinderError> {
        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        log::info!("Walking {}", path.display());

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
            callback.on_phase_start("walking", 0);
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) if self.config.strict => return Err(FinderError::Scan(e)),
                Err(e) => {
                    log::warn!("Skipping: {}", e);
                    errors.push(e);
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files ({} walk errors)",
            files.len(),
            errors.len()
        );
        Ok((files, errors))
    }

    /// Walk `path` and find every group of byte-identical files.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::enumerate`] and
    /// [`DuplicateFinder::find_duplicates_from_files`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(GroupCollection, ScanSummary), FinderError> {
        let start_time = Instant::now();

        let (files, scan_errors) = self.enumerate(path)?;
        let (groups, mut summary) = self.find_duplicates_from_files(files)?;

        summary.scan_errors = scan_errors;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Find duplicates from a pre-collected list of files.
    ///
    /// The result is set-equal to [`DuplicateFinder::find_duplicates_baseline`]
    /// for the same input; the size and prehash stages only decide which
    /// pairs are ever compared.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Read`] for the first read error in strict mode
    /// - [`FinderError::Interrupted`] if shutdown was requested
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(GroupCollection, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            ..Default::default()
        };

        log::info!(
            "Processing {} files ({})",
            summary.total_files,
            summary.total_size_display()
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 1: Size
        let sized = narrow(&SizeDiscriminator, files, self.shutdown());
        if sized.stats.interrupted {
            return Err(FinderError::Interrupted);
        }
        summary.eliminated_by_size = sized.stats.eliminated_unique;
        log::info!(
            "Phase 1 complete: {} → {} files in {} buckets ({:.1}% eliminated)",
            sized.stats.input_files,
            sized.stats.candidates,
            sized.stats.buckets,
            sized.stats.elimination_rate()
        );

        if sized.buckets.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            summary.scan_duration = start_time.elapsed();
            return Ok((GroupCollection::new(), summary));
        }

        // Phases 2 and 3, one task per size bucket
        let results = self.process_buckets(sized.buckets);

        let mut groups = Vec::new();
        let mut prehash_stats = StageStats::default();
        let mut compare_stats = BaselineStats::default();
        for result in results {
            groups.extend(result.groups);
            prehash_stats.merge(result.prehash);
            compare_stats.merge(result.compare);
        }

        if prehash_stats.interrupted
            || compare_stats.interrupted
            || self.config.is_shutdown_requested()
        {
            return Err(FinderError::Interrupted);
        }

        if self.config.prehash {
            log::info!(
                "Phase 2 complete: {} → {} files ({:.1}% eliminated)",
                prehash_stats.input_files,
                prehash_stats.candidates,
                prehash_stats.elimination_rate()
            );
        }

        let mut read_errors = std::mem::take(&mut prehash_stats.errors);
        read_errors.append(&mut compare_stats.errors);
        if self.config.strict && !read_errors.is_empty() {
            return Err(FinderError::Read(read_errors.swap_remove(0)));
        }

        let collection = GroupCollection::from_groups(groups);
        log::info!(
            "Phase 3 complete: {} comparisons, {} duplicate groups",
            compare_stats.comparisons,
            collection.len()
        );

        summary.eliminated_by_prehash = prehash_stats.eliminated_unique;
        summary.comparisons = compare_stats.comparisons;
        summary.duplicate_groups = collection.len();
        summary.duplicate_files = collection.duplicate_files();
        summary.reclaimable_space = collection.reclaimable_space();
        summary.read_errors = read_errors;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((collection, summary))
    }

    /// Group `files` with pivot comparison alone, skipping every pre-filter.
    ///
    /// This is the O(n²) reference the staged pipeline is checked against.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Read`] for the first read error in strict mode
    /// - [`FinderError::Interrupted`] if shutdown was requested
    pub fn find_duplicates_baseline(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(GroupCollection, BaselineStats), FinderError> {
        log::info!("Baseline grouping of {} files", files.len());

        let (groups, mut stats) = baseline::group_by_content(files, &self.comparer, self.shutdown());
        if stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        if self.config.strict && !stats.errors.is_empty() {
            return Err(FinderError::Read(stats.errors.swap_remove(0)));
        }

        log::info!(
            "Baseline complete: {} comparisons, {} duplicate groups",
            stats.comparisons,
            groups.len()
        );
        Ok((groups, stats))
    }

    /// Run the content phases over every size bucket on the I/O pool.
    fn process_buckets(&self, buckets: Vec<Vec<FileEntry>>) -> Vec<BucketResult> {
        let total = buckets.len();
        let done = AtomicUsize::new(0);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("compare", total);
        }
        log::info!(
            "Comparing {} size buckets on {} threads",
            total,
            self.config.io_threads
        );

        let work = || -> Vec<BucketResult> {
            buckets
                .into_par_iter()
                .map(|bucket| {
                    let label = bucket
                        .first()
                        .map(|f| f.path.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let result = self.process_bucket(bucket);

                    let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(current, &label);
                    }
                    result
                })
                .collect()
        };

        // Limited parallelism keeps the disk from thrashing
        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                log::warn!(
                    "Failed to create I/O thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                work()
            }
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("compare");
        }
        results
    }

    /// Prehash then pivot-compare one size bucket.
    fn process_bucket(&self, bucket: Vec<FileEntry>) -> BucketResult {
        let mut result = BucketResult::default();

        if self.config.is_shutdown_requested() {
            result.compare.interrupted = true;
            return result;
        }

        let size = bucket.first().map_or(0, |f| f.size);
        let candidates = if self.config.prehash {
            let outcome = narrow(&self.prehash, bucket, self.shutdown());
            result.prehash = outcome.stats;
            outcome.buckets
        } else {
            vec![bucket]
        };

        log::debug!(
            "Size bucket {} bytes: {} prehash buckets",
            size,
            candidates.len()
        );

        for candidate in candidates {
            let (groups, stats) = baseline::partition(candidate, &self.comparer, self.shutdown());
            result.compare.merge(stats);
            if result.compare.interrupted {
                break;
            }
            result.groups.extend(groups);
        }

        result
    }
}
