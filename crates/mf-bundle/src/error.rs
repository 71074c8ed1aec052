//! Error types for bundle operations.

use thiserror::Error;

/// Errors that can occur while framing a test bundle.
///
/// Every variant is fatal: a transform that hits one stops immediately and
/// the destination archive must be treated as unusable.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A script entry has no package entry in its group
    #[error("test bundle includes a test file without an accompanying package: '{script}' (group '{group}')")]
    MissingCompanion { group: String, script: String },

    /// The package's nested archive or its descriptor could not be read
    #[error("malformed app descriptor in '{package}': {reason}")]
    MalformedDescriptor { package: String, reason: String },

    /// Two scripts (or two packages) share one group
    #[error("group '{group}' holds more than one entry of the same kind: '{first}' and '{second}'")]
    DuplicateEntry {
        group: String,
        first: String,
        second: String,
    },

    /// Script body is not valid UTF-8
    #[error("script '{path}' is not valid UTF-8 text")]
    InvalidScriptEncoding { path: String },

    /// A template parameter would break the generated script (strict mode)
    #[error("unsafe value for {parameter}: {value:?}")]
    UnsafeParameter {
        parameter: &'static str,
        value: String,
    },

    /// The output path resolves to the input bundle
    #[error("output bundle must differ from the input bundle: {path}")]
    SameInputOutput { path: String },
}

impl BundleError {
    /// Whether the error is caused by the bundle's content rather than by
    /// the environment (disk, archive codec).
    pub fn is_invalid_bundle(&self) -> bool {
        matches!(
            self,
            BundleError::MissingCompanion { .. }
                | BundleError::MalformedDescriptor { .. }
                | BundleError::DuplicateEntry { .. }
                | BundleError::InvalidScriptEncoding { .. }
                | BundleError::UnsafeParameter { .. }
        )
    }

    /// Stable machine-readable name for JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            BundleError::Io(_) => "io",
            BundleError::Zip(_) => "zip",
            BundleError::MissingCompanion { .. } => "missing_companion",
            BundleError::MalformedDescriptor { .. } => "malformed_descriptor",
            BundleError::DuplicateEntry { .. } => "duplicate_entry",
            BundleError::InvalidScriptEncoding { .. } => "invalid_script_encoding",
            BundleError::UnsafeParameter { .. } => "unsafe_parameter",
            BundleError::SameInputOutput { .. } => "same_input_output",
        }
    }
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
