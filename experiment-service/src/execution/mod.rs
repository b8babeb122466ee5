// Execution
// Event reporting and the sequential run orchestrator.

pub mod events;
pub mod executor;

pub use events::{
    progress_channel, EventSender, ExecutionEvent, LogLevel, ProgressReceiver, ProgressSender,
};
pub use executor::{ExperimentExecutor, RunStatus, Submission};
