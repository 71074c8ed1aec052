//! Exit codes for the mf-core CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/input errors (fixable by changing arguments or the bundle)
//! - 20-29: Internal or environment errors

use mf_bundle::BundleError;

/// Exit codes for mf-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Input Errors (10-19)
    // ========================================================================
    /// Invalid arguments or configuration
    ArgsError = 10,

    /// Input bundle not found or unreadable as a file
    InputError = 11,

    /// Bundle content violates the layout contract (missing package,
    /// duplicate entry, malformed descriptor, unsafe name, non-UTF-8 script)
    BundleInvalid = 12,

    // ========================================================================
    // Internal / Environment Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// Archive could not be read or written
    ArchiveError = 22,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    /// Coarse class for JSON error output: `ok`, `user`, or `internal`.
    pub fn category(self) -> &'static str {
        if self.is_success() {
            "ok"
        } else if self.is_user_error() {
            "user"
        } else {
            "internal"
        }
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::BundleInvalid => "ERR_BUNDLE_INVALID",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::ArchiveError => "ERR_ARCHIVE",
        }
    }
}

impl From<&BundleError> for ExitCode {
    fn from(err: &BundleError) -> Self {
        match err {
            BundleError::Io(_) => ExitCode::IoError,
            BundleError::Zip(_) => ExitCode::ArchiveError,
            BundleError::SameInputOutput { .. } => ExitCode::ArgsError,
            e if e.is_invalid_bundle() => ExitCode::BundleInvalid,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
