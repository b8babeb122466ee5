// Error Types
// Configuration errors are fatal and reported before any dispatch begins.
// Environment errors cover missing executables; execution errors cover
// failures once the run is under way.

use std::path::PathBuf;

use thiserror::Error;

pub type ExperimentResult<T> = Result<T, ExperimentError>;

/// Top-level error for the experiment service
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// A problem with the experiment description itself
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("the key \"variables\" was not found in the input file")]
    MissingVariables,

    #[error("no command template found; supply \"command\" or \"jobs\"")]
    MissingCommand,

    #[error("expanding \"variables\" produced no combinations")]
    EmptyMatrix,

    #[error("the {combinator} keyword {reason}")]
    InvalidCombinatorArguments { combinator: String, reason: String },

    #[error("zip requires lists of equal length, expected {expected} values but found {found}")]
    ZipLengthMismatch { expected: usize, found: usize },

    #[error("{0} requires an enclosing variable name")]
    MissingParentKey(String),

    #[error("the variable \"{name}\" is missing from combination {index}")]
    IncompleteBinding { name: String, index: usize },

    #[error("unbound variable \"{name}\" in template \"{template}\"")]
    UnboundVariable { name: String, template: String },

    #[error("the scheduler \"{0}\" has no submission file format")]
    UnsupportedScheduler(String),
}

/// A required executable is not present on the system
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("the shell \"{0}\" was not found on the path")]
    ShellNotFound(String),

    #[error("the submission command \"{0}\" was not found on the path")]
    SubmitNotFound(String),
}

/// A failure while running or submitting commands
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("command exited with status {status}: {command}")]
    CommandFailed { command: String, status: i32 },

    #[error("failed to spawn \"{command}\": {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("submitting job {index} to the queue failed: {detail}")]
    SubmissionFailed { index: usize, detail: String },

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
