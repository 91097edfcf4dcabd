//! Error types for the diff crate.

use verity_policy::PolicyError;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Reading or releasing one of the compared sources failed.
    #[error("i/o error while comparing {actual} against {expected}: {source}")]
    Io {
        expected: String,
        actual: String,
        #[source]
        source: std::io::Error,
    },

    /// The equality policy could not decide.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// A patch did not match the lines it was applied to.
    #[error("patch does not apply at line {position}: expected {expected:?}, found {found:?}")]
    PatchMismatch {
        position: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A patch's deltas are out of order, overlapping, or inconsistently
    /// anchored, or a unified diff could not be parsed.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// An expected digest was not a valid hex-encoded BLAKE3 digest.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

impl DiffError {
    /// Returns `true` if a source could not be read or released.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
