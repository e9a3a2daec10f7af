//! Exit codes and structured error reporting.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::signal::EXIT_CODE_INTERRUPTED;

/// Process exit codes.
///
/// - 0: Success (the scan completed, whether or not duplicates were found)
/// - 1: General error (bad root, strict-mode failure, bad configuration)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the scan completed and the report was printed.
    Success = 0,
    /// General error: an error stopped the run.
    GeneralError = 1,
    /// Interrupted: the scan was interrupted by user (Ctrl+C).
    Interrupted = EXIT_CODE_INTERRUPTED as isize,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::Interrupted => "DF130",
        }
    }

    /// Choose the exit code for an error returned by the application.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Messages of the underlying causes, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_code_prefixes() {
        assert_eq!(ExitCode::Success.code_prefix(), "DF000");
        assert_eq!(ExitCode::GeneralError.code_prefix(), "DF001");
        assert_eq!(ExitCode::Interrupted.code_prefix(), "DF130");
    }

    #[test]
    fn test_for_error_interrupted() {
        let err = anyhow::Error::new(FinderError::Interrupted);
        assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
    }

    #[test]
    fn test_for_error_through_context() {
        let result: Result<(), FinderError> = Err(FinderError::Interrupted);
        let err = result.context("Scan failed").unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
    }

    #[test]
    fn test_for_error_general() {
        let err = anyhow::Error::new(FinderError::PathNotFound(PathBuf::from("/x")));
        assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);

        let err = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    }

    #[test]
    fn test_structured_error_json() {
        let result: Result<(), FinderError> =
            Err(FinderError::PathNotFound(PathBuf::from("/missing")));
        let err = result.context("Scan failed").unwrap_err();

        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        let json = serde_json::to_value(&structured).unwrap();

        assert_eq!(json["code"], "DF001");
        assert_eq!(json["exit_code"], 1);
        assert_eq!(json["message"], "Scan failed");
        assert_eq!(json["causes"][0], "Path not found: /missing");
        assert_eq!(json["interrupted"], false);
    }
}
