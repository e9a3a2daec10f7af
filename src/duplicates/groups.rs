//! Duplicate groups and the collection they are reported in.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is one equivalence class of byte-identical files with
//! at least two members. A [`GroupCollection`] holds every group found by one
//! grouper run.
//!
//! Both types normalise their order on construction: members are sorted by
//! path, and groups are sorted by their representative (first member) path.
//! Report selection relies on this order to break ties deterministically.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::{DuplicateGroup, GroupCollection};
//! use dupfind::scanner::FileEntry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let entry = |p: &str| FileEntry::new(PathBuf::from(p), 100, SystemTime::now());
//! let groups = GroupCollection::from_groups(vec![
//!     DuplicateGroup::new(100, vec![entry("/z/b"), entry("/z/a")]),
//!     DuplicateGroup::new(100, vec![entry("/y/b"), entry("/y/a")]),
//! ]);
//!
//! assert_eq!(groups.len(), 2);
//! assert_eq!(groups.groups()[0].representative().path, PathBuf::from("/y/a"));
//! assert_eq!(groups.reclaimable_space(), 200);
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::scanner::FileEntry;

/// Confirmed duplicate group of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// File size in bytes (shared by all files in the group)
    pub size: u64,
    /// Files with identical content, sorted by path
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Create a new duplicate group. Members are sorted by path.
    ///
    /// # Arguments
    ///
    /// * `size` - File size in bytes
    /// * `files` - Byte-identical file entries
    #[must_use]
    pub fn new(size: u64, mut files: Vec<FileEntry>) -> Self {
        debug_assert!(
            files.iter().all(|f| f.size == size),
            "group members must share size {}",
            size
        );
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The member kept when the others are considered copies.
    ///
    /// # Panics
    ///
    /// Panics if the group is empty, which the groupers never produce.
    #[must_use]
    pub fn representative(&self) -> &FileEntry {
        &self.files[0]
    }

    /// Every member except the representative.
    #[must_use]
    pub fn copies(&self) -> &[FileEntry] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space recovered by keeping one copy and deleting the rest.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Check whether `path` is a member of this group.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// All duplicate groups found in one run, in representative-path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupCollection {
    groups: Vec<DuplicateGroup>,
}

impl GroupCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, normalising member and group order.
    ///
    /// Groups with fewer than two members carry no information and are dropped.
    #[must_use]
    pub fn from_groups(groups: impl IntoIterator<Item = DuplicateGroup>) -> Self {
        let mut groups: Vec<DuplicateGroup> = groups
            .into_iter()
            .filter(|g| g.len() > 1)
            .map(|g| DuplicateGroup::new(g.size, g.files))
            .collect();
        groups.sort_by(|a, b| a.representative().path.cmp(&b.representative().path));
        Self { groups }
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The groups, in collection order.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Iterate over the groups in collection order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }

    /// Consume the collection, returning its groups.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        self.groups
    }

    /// Number of files that are copies of some representative.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Total space recovered by keeping one file per group.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::reclaimable_space).sum()
    }

    /// The partition as a set of path sets, independent of any ordering.
    ///
    /// Two collections describe the same partition iff their `partition()`
    /// values are equal.
    #[must_use]
    pub fn partition(&self) -> BTreeSet<BTreeSet<PathBuf>> {
        self.groups
            .iter()
            .map(|g| g.files.iter().map(|f| f.path.clone()).collect())
            .collect()
    }

    /// Check whether two collections contain the same groups.
    #[must_use]
    pub fn same_partition(&self, other: &GroupCollection) -> bool {
        self.partition() == other.partition()
    }
}

impl<'a> IntoIterator for &'a GroupCollection {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
