/// Build orchestration error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Target not found: {target}")]
    TargetNotFound { target: String },

    #[error("Cyclic dependency detected: {0}")]
    CyclicDependency(String),

    #[error("Target '{target}' declares input {path} which does not exist")]
    MissingInput { target: String, path: PathBuf },

    #[error("Target '{target}' did not produce declared output {path}")]
    MissingOutput { target: String, path: PathBuf },

    #[error("Stamp error: {0}")]
    StampError(String),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),
}

impl BuildError {
    /// Create a target not found error
    pub fn target_not_found(target: impl Into<String>) -> Self {
        Self::TargetNotFound {
            target: target.into(),
        }
    }

    /// Create a missing input contract error
    pub fn missing_input(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            target: target.into(),
            path: path.into(),
        }
    }

    /// Create a missing output contract error
    pub fn missing_output(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingOutput {
            target: target.into(),
            path: path.into(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }
}
