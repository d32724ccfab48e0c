//! Error types for strap-core

use std::path::PathBuf;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort an orchestration run.
///
/// Dev-requirements and hook failures are absorbed at their stage and never
/// surface through this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from configuration loading
    #[error(transparent)]
    Config(#[from] strap_config::Error),

    /// A prerequisite executable is missing from the search path.
    #[error("Requirement {name:?} is not found in system")]
    MissingPrerequisite { name: String },

    /// The installer executable is absent from the target environment.
    #[error("No pip found at {path:?}")]
    InstallerNotFound { path: PathBuf },

    /// A placeholder named something absent from the interpolation context.
    #[error("Unknown name {name:?} in interpolation placeholder")]
    Interpolation { name: String },

    /// A fatal-stage child process exited non-zero.
    #[error("Command {command:?} returned non-zero exit status {code}")]
    ChildProcess { command: String, code: i32 },

    /// A child process could not be started at all.
    #[error("Failed to run command {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
