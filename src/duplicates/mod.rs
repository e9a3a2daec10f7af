//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Staged bucketing by size and prehash (see [`stages`])
//! - Pivot grouping by exact byte comparison (see [`baseline`])
//! - The finder that runs the full pipeline (see [`finder`])
//! - Duplicate group management (see [`groups`])

pub mod baseline;
pub mod finder;
pub mod groups;
pub mod stages;

pub use baseline::{group_by_content, BaselineStats};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{DuplicateGroup, GroupCollection};
pub use stages::{
    narrow, Discriminator, PrehashDiscriminator, SizeDiscriminator, StageOutcome, StageStats,
};
