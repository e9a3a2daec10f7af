//! Command-line interface definitions for dupfind.
//!
//! # Example
//!
//! ```bash
//! # Scan ./images (the default) and print the report
//! dupfind
//!
//! # Scan a directory and emit JSON
//! dupfind ~/Pictures --output json
//!
//! # Ignore empty files and anything over 1 GB
//! dupfind ~/Downloads --min-size 1 --max-size 1GB
//!
//! # Also time the pairwise reference grouper
//! dupfind ~/Downloads --compare-baseline -v
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Find files with identical content under a directory.
///
/// Reports the file with the most copies and the file whose copies waste the
/// most disk space. Files are never modified.
#[derive(Debug, Parser)]
#[command(name = "dupfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan
    #[arg(value_name = "PATH", default_value = "images")]
    pub path: PathBuf,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and the report
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Minimum file size to consider (e.g., 1, 1KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB.
    /// `--min-size 1` leaves empty files out.
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Gitignore-style patterns to skip (can be specified multiple times)
    ///
    /// `.gitignore` files in the scanned tree are not read.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan
    ///
    /// A file reached through a link and directly is listed once, so a link
    /// is never reported as a copy of its own target.
    /// Warning: symlink cycles are not detected.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Number of threads comparing files [default: 4]
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Skip the 4 KiB prehash stage and byte-compare every same-size pair
    #[arg(long)]
    pub no_prehash: bool,

    /// Fail on the first unreadable file instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Also run the pairwise reference grouper and compare runtimes
    #[arg(long)]
    pub compare_baseline: bool,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", env = "DUPFIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Whether progress bars should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress && self.output == OutputFormat::Text
    }
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupfind::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
