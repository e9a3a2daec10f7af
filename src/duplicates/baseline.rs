//! Pivot-based grouping by exact content comparison.
//!
//! # Overview
//!
//! [`group_by_content`] partitions a list of files into classes of
//! byte-identical content with nothing but the equality predicate:
//!
//! 1. take the first remaining file as pivot
//! 2. compare it with every other remaining file
//! 3. the pivot and its matches form one class; drop them from the remaining set
//! 4. repeat until nothing remains
//!
//! Classes with two or more members become [`DuplicateGroup`]s. This costs
//! O(n²) comparisons when all files differ, so the duplicate finder only runs
//! it inside buckets that survived the cheaper stages. On its own it is the
//! reference the staged pipeline must agree with.
//!
//! A file that cannot be read is treated as matching nothing: it is dropped
//! from every class and its error is recorded.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{DuplicateGroup, GroupCollection};
use crate::scanner::{ContentEq, FileEntry, ReadError};

/// State of one file in the remaining set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Not yet assigned to a class
    Live,
    /// Assigned to the class of some pivot
    Consumed,
    /// Excluded after a read error
    Unreadable,
}

/// Arena of candidate files with a per-file state.
///
/// The set owns its files, so the caller's list is never aliased while
/// rounds shrink the live portion.
#[derive(Debug)]
struct RemainingSet {
    files: Vec<FileEntry>,
    slots: Vec<Slot>,
    /// Every slot before this index is not live
    cursor: usize,
}

impl RemainingSet {
    fn new(files: Vec<FileEntry>) -> Self {
        let slots = vec![Slot::Live; files.len()];
        Self {
            files,
            slots,
            cursor: 0,
        }
    }

    /// First live file, if any.
    fn next_pivot(&mut self) -> Option<usize> {
        while self.cursor < self.slots.len() && self.slots[self.cursor] != Slot::Live {
            self.cursor += 1;
        }
        (self.cursor < self.slots.len()).then_some(self.cursor)
    }

    /// Live files after `pivot`, in input order.
    fn live_after(&self, pivot: usize) -> Vec<usize> {
        (pivot + 1..self.slots.len())
            .filter(|&i| self.slots[i] == Slot::Live)
            .collect()
    }

    fn set(&mut self, index: usize, slot: Slot) {
        self.slots[index] = slot;
    }

    /// Move the files of each class out of the arena.
    fn into_groups(self, classes: Vec<Vec<usize>>) -> Vec<DuplicateGroup> {
        let mut files: Vec<Option<FileEntry>> = self.files.into_iter().map(Some).collect();
        classes
            .into_iter()
            .map(|class| {
                let members: Vec<FileEntry> =
                    class.into_iter().filter_map(|i| files[i].take()).collect();
                let size = members.first().map_or(0, |f| f.size);
                DuplicateGroup::new(size, members)
            })
            .collect()
    }
}

/// Statistics from pivot grouping.
#[derive(Debug, Default)]
pub struct BaselineStats {
    /// Files that entered grouping
    pub input_files: usize,
    /// Number of equality predicate evaluations
    pub comparisons: usize,
    /// Number of classes with 2+ members
    pub duplicate_groups: usize,
    /// Files excluded after a read error
    pub failed_files: usize,
    /// Errors for the excluded files
    pub errors: Vec<ReadError>,
    /// Whether grouping stopped early on shutdown
    pub interrupted: bool,
}

impl BaselineStats {
    /// Fold the statistics of another grouping run into this one.
    pub fn merge(&mut self, other: BaselineStats) {
        self.input_files += other.input_files;
        self.comparisons += other.comparisons;
        self.duplicate_groups += other.duplicate_groups;
        self.failed_files += other.failed_files;
        self.errors.extend(other.errors);
        self.interrupted |= other.interrupted;
    }
}

/// Group `files` by content using pivot comparison.
///
/// # Example
///
/// ```no_run
/// use dupfind::duplicates::group_by_content;
/// use dupfind::scanner::{ByteComparer, FileEntry};
///
/// let files = vec![
///     FileEntry::from_path("a.txt").unwrap(),
///     FileEntry::from_path("b.txt").unwrap(),
/// ];
/// let (groups, stats) = group_by_content(files, &ByteComparer::new(), None);
/// println!("{} groups after {} comparisons", groups.len(), stats.comparisons);
/// ```
#[must_use]
pub fn group_by_content<C: ContentEq + ?Sized>(
    files: Vec<FileEntry>,
    comparer: &C,
    shutdown: Option<&AtomicBool>,
) -> (GroupCollection, BaselineStats) {
    let (groups, stats) = partition(files, comparer, shutdown);
    (GroupCollection::from_groups(groups), stats)
}

/// Pivot grouping without collection normalisation.
///
/// Used by the finder on each bucket; the merged result is normalised once.
pub(crate) fn partition<C: ContentEq + ?Sized>(
    files: Vec<FileEntry>,
    comparer: &C,
    shutdown: Option<&AtomicBool>,
) -> (Vec<DuplicateGroup>, BaselineStats) {
    let mut stats = BaselineStats {
        input_files: files.len(),
        ..Default::default()
    };
    let is_shutdown = || shutdown.is_some_and(|f| f.load(Ordering::SeqCst));

    let mut set = RemainingSet::new(files);
    let mut classes: Vec<Vec<usize>> = Vec::new();

    'rounds: while let Some(pivot) = set.next_pivot() {
        set.set(pivot, Slot::Consumed);
        let mut class = vec![pivot];
        let mut pivot_failed = false;

        for candidate in set.live_after(pivot) {
            if is_shutdown() {
                stats.interrupted = true;
                break 'rounds;
            }

            stats.comparisons += 1;
            match comparer.equal(&set.files[pivot], &set.files[candidate]) {
                Ok(true) => {
                    set.set(candidate, Slot::Consumed);
                    class.push(candidate);
                }
                Ok(false) => {}
                Err(e) if e.is_interrupted() => {
                    stats.interrupted = true;
                    break 'rounds;
                }
                Err(e) => {
                    stats.failed_files += 1;
                    if e.path() == set.files[pivot].path {
                        log::warn!("Excluding unreadable file {}: {}", e.path().display(), e);
                        stats.errors.push(e);
                        set.set(pivot, Slot::Unreadable);
                        // Matches so far were only vouched for by the pivot
                        for &member in &class[1..] {
                            set.set(member, Slot::Live);
                        }
                        pivot_failed = true;
                        break;
                    }
                    log::warn!("Excluding unreadable file {}: {}", e.path().display(), e);
                    stats.errors.push(e);
                    set.set(candidate, Slot::Unreadable);
                }
            }
        }

        if !pivot_failed && class.len() > 1 {
            log::debug!(
                "Content class of {}: {} files",
                set.files[pivot].path.display(),
                class.len()
            );
            classes.push(class);
        }
    }

    if stats.interrupted {
        log::debug!("Pivot grouping interrupted by shutdown");
        return (Vec::new(), stats);
    }

    stats.duplicate_groups = classes.len();
    (set.into_groups(classes), stats)
}
