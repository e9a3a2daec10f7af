//! Summary report over a duplicate collection.
//!
//! [`Report::build`] picks two groups out of a [`GroupCollection`]:
//!
//! - the **most duplicated** group, with the greatest member count
//! - the **most reclaimable** group, with the greatest
//!   `(member_count - 1) * size`, i.e. the space freed by keeping one copy
//!
//! Ties go to the first maximal group in collection order, which is the group
//! with the lexicographically smallest representative path.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::{DuplicateGroup, GroupCollection};
//! use dupfind::output::Report;
//! use dupfind::scanner::FileEntry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let entry = |p: &str, size| FileEntry::new(PathBuf::from(p), size, SystemTime::now());
//! let groups = GroupCollection::from_groups(vec![
//!     DuplicateGroup::new(100, vec![entry("/a1", 100), entry("/a2", 100), entry("/a3", 100)]),
//!     DuplicateGroup::new(1000, vec![entry("/b1", 1000), entry("/b2", 1000)]),
//! ]);
//!
//! let report = Report::build(&groups).unwrap();
//! assert_eq!(report.most_duplicated.representative, PathBuf::from("/a1"));
//! assert_eq!(report.most_reclaimable.representative, PathBuf::from("/b1"));
//! assert_eq!(report.most_reclaimable.reclaimable, 1000);
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, GroupCollection};

/// Title line of the text report.
pub const REPORT_TITLE: &str = "== == Duplicate File Finder Report == ==";

/// Line printed when the collection is empty.
pub const NO_DUPLICATES: &str = "No duplicates found";

/// One selected group, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    /// The member kept as the original
    pub representative: PathBuf,
    /// The other members
    pub copies: Vec<PathBuf>,
    /// Number of members including the representative
    pub member_count: usize,
    /// Size of each member in bytes
    pub file_size: u64,
    /// Bytes freed by deleting the copies
    pub reclaimable: u64,
}

impl GroupSummary {
    fn from_group(group: &DuplicateGroup) -> Self {
        Self {
            representative: group.representative().path.clone(),
            copies: group.copies().iter().map(|f| f.path.clone()).collect(),
            member_count: group.len(),
            file_size: group.size,
            reclaimable: group.reclaimable_space(),
        }
    }
}

/// The two headline statistics of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Group with the most members
    pub most_duplicated: GroupSummary,
    /// Group whose copies take up the most space
    pub most_reclaimable: GroupSummary,
}

impl Report {
    /// Select the headline groups. Returns `None` for an empty collection.
    #[must_use]
    pub fn build(groups: &GroupCollection) -> Option<Self> {
        let most_duplicated = first_max_by_key(groups.groups(), DuplicateGroup::len)?;
        let most_reclaimable =
            first_max_by_key(groups.groups(), DuplicateGroup::reclaimable_space)?;

        Some(Self {
            most_duplicated: GroupSummary::from_group(most_duplicated),
            most_reclaimable: GroupSummary::from_group(most_reclaimable),
        })
    }

    /// Write the plain-text report.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_text<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", REPORT_TITLE)?;

        let top = &self.most_duplicated;
        writeln!(
            writer,
            "The file with the most duplicates is: {}",
            top.representative.display()
        )?;
        write_copies(writer, &top.copies)?;

        let big = &self.most_reclaimable;
        writeln!(
            writer,
            "The most disk space {} could be recovered, by deleting copies of this file: {}",
            big.reclaimable,
            big.representative.display()
        )?;
        write_copies(writer, &big.copies)
    }
}

/// Write the text report for `groups`, or the no-duplicates line.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_text_report<W: Write>(groups: &GroupCollection, writer: &mut W) -> io::Result<()> {
    match Report::build(groups) {
        Some(report) => report.write_text(writer),
        None => writeln!(writer, "{}", NO_DUPLICATES),
    }
}

fn write_copies<W: Write>(writer: &mut W, copies: &[PathBuf]) -> io::Result<()> {
    writeln!(writer, "Here are its {} copies:", copies.len())?;
    for copy in copies {
        writeln!(writer, "{}", copy.display())?;
    }
    Ok(())
}

/// First group with the greatest key; later equal keys do not replace it.
fn first_max_by_key<K, F>(groups: &[DuplicateGroup], key: F) -> Option<&DuplicateGroup>
where
    K: Ord,
    F: Fn(&DuplicateGroup) -> K,
{
    let mut best: Option<(&DuplicateGroup, K)> = None;
    for group in groups {
        let k = key(group);
        if best.as_ref().map_or(true, |(_, current)| k > *current) {
            best = Some((group, k));
        }
    }
    best.map(|(group, _)| group)
}
