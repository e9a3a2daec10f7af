//! Ctrl+C handling for graceful shutdown.
//!
//! A single `Arc<AtomicBool>` is shared by the walker, the prehash stage and
//! the byte comparer. Setting it makes every worker stop at its next check
//! point; open files are closed as their owners go out of scope.
//!
//! ```rust,no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig};
//! use dupfind::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let finder = DuplicateFinder::new(
//!     FinderConfig::default().with_shutdown_flag(handler.get_flag()),
//! );
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption: 128 + signal number.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown as if Ctrl+C had been pressed.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get the flag to hand to [`crate::duplicates::FinderConfig::with_shutdown_flag`].
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can be reused for another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler that sets the shutdown flag on interrupt.
///
/// The process-wide hook can only be registered once. Later calls (several
/// `run_app` invocations in one test binary, for instance) get the already
/// installed handler back with its flag cleared. If the hook was registered by
/// someone else, an unhooked handler is returned that still honours
/// [`ShutdownHandler::request_shutdown`].
///
/// # Errors
///
/// Currently always succeeds; the `Result` keeps the installation failure
/// visible in the signature.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler);
        }
        Err(e) => {
            log::debug!("Ctrl+C handler not installed ({}), using unhooked handler", e);
            let _ = GLOBAL_HANDLER.set(ShutdownHandler::new());
        }
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
    handler.reset();
    Ok(handler.clone())
}
