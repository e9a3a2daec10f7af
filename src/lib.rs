//! dupfind - Duplicate File Finder
//!
//! Walks a directory tree, groups files with byte-identical content and
//! reports the file with the most copies and the file whose copies waste the
//! most space. Grouping narrows candidates by size and by a BLAKE3 hash of the
//! first 4 KiB before confirming every group with a full byte comparison.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::cli::{Cli, OutputFormat};
use crate::config::Settings;
use crate::duplicates::{DuplicateFinder, GroupCollection};
use crate::error::ExitCode;
use crate::output::{write_text_report, JsonOutput};
use crate::progress::Progress;
use crate::scanner::FileEntry;

/// Run the application, writing the report to stdout.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the root cannot be scanned,
/// a strict-mode error occurs, the scan is interrupted or the report cannot
/// be written. Use [`ExitCode::for_error`] to map it to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_app_with_output(cli, &mut out)
}

/// Run the application, writing the report to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_with_output<W: Write>(cli: Cli, out: &mut W) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_cli_overrides(&cli);
    settings.validate()?;
    log::debug!("Effective settings: {:?}", settings);

    if cli.print_config {
        write!(out, "{}", settings.to_toml()?)?;
        return Ok(ExitCode::Success);
    }

    let handler = signal::install_handler()?;
    let mut config = settings
        .finder_config()
        .with_shutdown_flag(handler.get_flag());
    if cli.show_progress() {
        config = config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    let finder = DuplicateFinder::new(config);

    let start = Instant::now();
    let (files, scan_errors) = finder
        .enumerate(&cli.path)
        .with_context(|| format!("Failed to scan {}", cli.path.display()))?;
    let baseline_files = cli.compare_baseline.then(|| files.clone());

    let (groups, mut summary) = finder.find_duplicates_from_files(files)?;
    summary.scan_errors = scan_errors;
    summary.scan_duration = start.elapsed();

    if summary.has_errors() {
        log::warn!(
            "{} entries were skipped because of errors",
            summary.scan_errors.len() + summary.read_errors.len()
        );
    }
    log::info!(
        "{} of {} could be reclaimed ({:.1}%)",
        summary.reclaimable_display(),
        summary.total_size_display(),
        summary.wasted_percentage()
    );

    match cli.output {
        OutputFormat::Text => {
            write_text_report(&groups, out)?;
            writeln!(
                out,
                "Runtime: {:.2} seconds",
                start.elapsed().as_secs_f64()
            )?;
        }
        OutputFormat::Json => {
            JsonOutput::new(&groups, &summary, ExitCode::Success).write_to(out, true)?;
        }
    }

    if let Some(files) = baseline_files {
        run_baseline(&finder, files, &groups, cli.output, out)?;
    }

    Ok(ExitCode::Success)
}

/// Regroup `files` with the pairwise reference grouper and report its runtime.
fn run_baseline<W: Write>(
    finder: &DuplicateFinder,
    files: Vec<FileEntry>,
    staged: &GroupCollection,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let start = Instant::now();
    let (groups, stats) = finder.find_duplicates_baseline(files)?;

    if format == OutputFormat::Text {
        writeln!(out, "\n\n .. and now with the pairwise reference search:")?;
        write_text_report(&groups, out)?;
        writeln!(
            out,
            "Runtime: {:.2} seconds",
            start.elapsed().as_secs_f64()
        )?;
    } else {
        log::info!(
            "Reference search: {} comparisons in {:.2} seconds",
            stats.comparisons,
            start.elapsed().as_secs_f64()
        );
    }

    if groups.same_partition(staged) {
        log::info!("Reference search agrees with the staged search");
    } else {
        log::warn!(
            "Reference search found {} groups, staged search found {}",
            groups.len(),
            staged.len()
        );
    }
    Ok(())
}
