use std::path::PathBuf;

use thiserror::Error;

use super::constraints::ViolationReport;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Malformed {artifact} artifact: {reason}")]
    MalformedArtifact { artifact: String, reason: String },

    #[error("Cannot read symbol file {}: {source}", path.display())]
    MalformedSymbols {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    ConstraintViolation(Box<ViolationReport>),

    #[error("Output variable not defined: {0}")]
    UnknownOutputSignal(String),

    #[error("Output variable {0} was removed by the compiler and has no witness slot")]
    OutputSignalEliminated(String),

    #[error("Output mismatch at {path}: actual {actual}, expected {expected}")]
    OutputMismatch {
        path: String,
        actual: String,
        expected: String,
    },

    #[error("Circuit not loaded; call load() before verifying witnesses")]
    NotLoaded,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CheckError {
    pub fn malformed(artifact: &str, reason: impl Into<String>) -> Self {
        CheckError::MalformedArtifact {
            artifact: artifact.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CheckError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn output_mismatch(path: &str, actual: &str, expected: &str) -> Self {
        CheckError::OutputMismatch {
            path: path.to_string(),
            actual: actual.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn invalid_config(details: impl Into<String>) -> Self {
        CheckError::InvalidConfig(details.into())
    }

    /// True for failures caused by the witness or the expected outputs
    /// rather than by unreadable or structurally broken inputs.
    pub fn is_test_failure(&self) -> bool {
        matches!(
            self,
            CheckError::ConstraintViolation(_)
                | CheckError::UnknownOutputSignal(_)
                | CheckError::OutputSignalEliminated(_)
                | CheckError::OutputMismatch { .. }
        )
    }
}

/// Result type alias for convenience
pub type CheckResult<T> = Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_message_names_artifact() {
        let err = CheckError::malformed("wtns", "section 2 truncated");
        assert_eq!(
            err.to_string(),
            "Malformed wtns artifact: section 2 truncated"
        );
        assert!(!err.is_test_failure());
    }

    #[test]
    fn output_mismatch_is_a_test_failure() {
        let err = CheckError::output_mismatch("main.out", "7", "8");
        assert!(err.is_test_failure());
        assert_eq!(
            err.to_string(),
            "Output mismatch at main.out: actual 7, expected 8"
        );
    }
}
