//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "report": {
//!     "most_duplicated": {
//!       "representative": "/photos/a.jpg",
//!       "copies": ["/photos/b.jpg", "/backup/a.jpg"],
//!       "member_count": 3,
//!       "file_size": 1024,
//!       "reclaimable": 2048
//!     },
//!     "most_reclaimable": { "...": "..." }
//!   },
//!   "duplicates": [
//!     { "size": 1024, "files": ["/backup/a.jpg", "/photos/a.jpg", "/photos/b.jpg"] }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "comparisons": 12,
//!     "scan_duration_ms": 1234,
//!     "errors": [],
//!     "exit_code": 0,
//!     "exit_code_name": "DF000"
//!   }
//! }
//! ```
//!
//! `report` is `null` when no duplicates were found.

use std::io::Write;

use serde::Serialize;

use super::Report;
use crate::duplicates::{DuplicateGroup, GroupCollection, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// File size in bytes
    pub size: u64,
    /// Paths of all members, representative first
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Convert a [`DuplicateGroup`], keeping member order.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files that entered grouping
    pub total_files: usize,
    /// Combined size of those files in bytes
    pub total_size: u64,
    /// Files eliminated by a unique size
    pub eliminated_by_size: usize,
    /// Files eliminated by a unique prehash
    pub eliminated_by_prehash: usize,
    /// Byte comparisons performed
    pub comparisons: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding representatives)
    pub duplicate_files: usize,
    /// Bytes recovered by deleting every copy
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Messages of the walk and read errors that excluded files
    pub errors: Vec<String>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DF000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            eliminated_by_size: summary.eliminated_by_size,
            eliminated_by_prehash: summary.eliminated_by_prehash,
            comparisons: summary.comparisons,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            errors: summary
                .scan_errors
                .iter()
                .map(ToString::to_string)
                .chain(summary.read_errors.iter().map(ToString::to_string))
                .collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Headline statistics, `None` when nothing was found
    pub report: Option<Report>,
    /// Every duplicate group in collection order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate groups, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use dupfind::duplicates::{GroupCollection, ScanSummary};
    /// use dupfind::error::ExitCode;
    /// use dupfind::output::JsonOutput;
    ///
    /// let output = JsonOutput::new(&GroupCollection::new(), &ScanSummary::default(), ExitCode::Success);
    /// assert!(output.report.is_none());
    /// assert!(output.to_json().unwrap().starts_with('{'));
    /// ```
    #[must_use]
    pub fn new(groups: &GroupCollection, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            report: Report::build(groups),
            duplicates: groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
