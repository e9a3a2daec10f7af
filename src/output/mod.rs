//! Report rendering for duplicate scan results.
//!
//! - [`report`]: headline statistics and the plain-text report
//! - [`json`]: JSON document for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::DuplicateFinder;
//! use dupfind::output::write_text_report;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Path::new("images")).unwrap();
//! write_text_report(&groups, &mut std::io::stdout().lock()).unwrap();
//! ```

pub mod json;
pub mod report;

pub use json::{JsonOutput, JsonOutputError};
pub use report::{write_text_report, GroupSummary, Report, NO_DUPLICATES, REPORT_TITLE};
