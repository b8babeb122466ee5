// Experiment Service Library
// Expands a declarative experiment description into concrete commands and
// dispatches them to a shell or a batch-queue scheduler.

pub mod error;
pub mod execution;
pub mod jobs;
pub mod matrix;
pub mod parser;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use error::{
    ConfigError, EnvironmentError, ExecutionError, ExperimentError, ExperimentResult,
};

// Re-export parser types
pub use parser::models::{
    yaml_to_value, CommandSpec, ExperimentFile, JobDef, OptionValue, SchedulerOptions,
    SchedulerToggle, Setup, Value,
};
pub use parser::{normalize_experiment, Experiment, ExperimentParser};

// Re-export matrix types
pub use matrix::{expand, variable_matrix, Binding, MergeMode, VariableMatrix};

// Re-export job types
pub use jobs::{build_jobs, materialize, Command, Job};

// Re-export scheduler types
pub use scheduler::{render, SchedulerKind};

// Re-export execution types
pub use execution::{
    progress_channel, EventSender, ExecutionEvent, ExperimentExecutor, LogLevel, ProgressReceiver,
    ProgressSender, RunStatus, Submission,
};
