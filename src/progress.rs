//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display progress bars on stderr while the finder runs. Phases reported by
//! the finder are `"walking"` (spinner, open-ended) and `"compare"` (bar over
//! size buckets).

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (`"walking"` or `"compare"`)
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    compare: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupfind::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
        };
        Self {
            multi,
            walking: Mutex::new(None),
            compare: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn compare_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} buckets ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    /// The bar of the phase currently running.
    fn active(&self) -> Option<ProgressBar> {
        lock(&self.compare)
            .clone()
            .or_else(|| lock(&self.walking).clone())
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            "walking" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                *lock(&self.walking) = Some(pb);
            }
            "compare" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::compare_style());
                pb.set_message("Comparing");
                *lock(&self.compare) = Some(pb);
            }
            other => log::debug!("No progress bar for phase {}", other),
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.active() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let (slot, message) = match phase {
            "walking" => (&self.walking, "Walking complete"),
            "compare" => (&self.compare, "Comparison complete"),
            _ => return,
        };
        if let Some(pb) = lock(slot).take() {
            pb.finish_with_message(message);
        }
    }
}

fn lock(slot: &Mutex<Option<ProgressBar>>) -> MutexGuard<'_, Option<ProgressBar>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_path() {
        assert_eq!(truncate_path("a/b.txt", 30), "a/b.txt");
    }

    #[test]
    fn test_truncate_long_path_keeps_file_name() {
        let path = "/very/long/directory/structure/that/goes/on/photo.jpg";
        assert_eq!(truncate_path(path, 30), ".../photo.jpg");
    }

    #[test]
    fn test_truncate_long_file_name() {
        let name = "x".repeat(40);
        let truncated = truncate_path(&format!("/dir/{}", name), 30);

        assert!(truncated.starts_with("..."));
        assert_eq!(truncated.chars().count(), 30);
    }

    #[test]
    fn test_truncate_multibyte() {
        let path = format!("/dir/{}", "é".repeat(40));
        let truncated = truncate_path(&path, 30);
        assert_eq!(truncated.chars().count(), 30);
    }

    #[test]
    fn test_quiet_progress_ignores_events() {
        let progress = Progress::new(true);
        progress.on_phase_start("walking", 0);
        progress.on_progress(1, "/a");
        progress.on_phase_end("walking");

        assert!(lock(&progress.walking).is_none());
    }

    #[test]
    fn test_phase_lifecycle() {
        let progress = Progress::new(false);
        progress.on_phase_start("compare", 3);
        assert!(lock(&progress.compare).is_some());

        progress.on_progress(1, "/some/file");
        progress.on_phase_end("compare");
        assert!(lock(&progress.compare).is_none());

        // Unknown phases are ignored
        progress.on_phase_start("other", 1);
        progress.on_phase_end("other");
    }
}
