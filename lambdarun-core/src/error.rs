//! Invocation error types

use crate::result::RunResult;
use thiserror::Error;

/// Errors from a container invocation
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The container ran but exited with a non-zero code. Carries the same
    /// shape as a successful run.
    #[error("container exited with code {}", .0.code)]
    NonZeroExit(RunResult),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid event payload: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvokeError {
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// The run result carried by a non-zero exit
    pub fn run_result(&self) -> Option<&RunResult> {
        match self {
            Self::NonZeroExit(result) => Some(result),
            _ => None,
        }
    }

    /// Exit code a CLI should report for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NonZeroExit(result) => result.code,
            Self::Spawn { .. } => 127,
            Self::InvalidEvent(_) | Self::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_carries_result() {
        let error = InvokeError::NonZeroExit(RunResult::new(2, "a", "b"));
        assert_eq!(error.to_string(), "container exited with code 2");
        assert_eq!(error.run_result(), Some(&RunResult::new(2, "a", "b")));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_spawn_error_has_no_result() {
        let error = InvokeError::spawn(
            "docker",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(error.to_string().contains("docker"));
        assert!(error.run_result().is_none());
        assert_eq!(error.exit_code(), 127);
    }
}
