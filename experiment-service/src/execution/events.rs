// Execution Events
// Progress reporting for experiment dispatch. The executor never prints;
// callers receive events on an injected channel and decide how to render
// them.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::scheduler::SchedulerKind;

/// Sender for execution progress events
pub type ProgressSender = mpsc::UnboundedSender<ExecutionEvent>;

/// Receiver for execution progress events
pub type ProgressReceiver = mpsc::UnboundedReceiver<ExecutionEvent>;

/// Create a new progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted while a run is dispatched
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// The run started dispatching
    RunStarted {
        scheduler: SchedulerKind,
        total_jobs: usize,
    },

    /// A job's commands started executing (shell dispatch)
    JobStarted {
        job_index: usize,
        total_commands: usize,
    },

    /// One command is about to run
    CommandStarted {
        job_index: usize,
        command_index: usize,
        command: String,
    },

    /// One command finished
    CommandCompleted {
        job_index: usize,
        command_index: usize,
        exit_code: Option<i32>,
        success: bool,
    },

    /// A stale submission file was deleted before the run
    FileRemoved { path: PathBuf },

    /// A submission file was written (batch dispatch)
    FileWritten { path: PathBuf, job_index: usize },

    /// A job was accepted by the batch queue
    JobSubmitted {
        job_index: usize,
        job_id: String,
        depends_on: Vec<String>,
    },

    /// Free-form diagnostic message
    Log { level: LogLevel, message: String },

    /// The run finished
    RunCompleted { success: bool },
}

/// Log level for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl ExecutionEvent {
    pub fn debug(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Debug,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Error,
            message: message.into(),
        }
    }
}

/// Helper trait for sending events, ignoring errors (fire-and-forget)
pub trait EventSender {
    fn send_event(&self, event: ExecutionEvent);
}

impl EventSender for ProgressSender {
    fn send_event(&self, event: ExecutionEvent) {
        let _ = self.send(event);
    }
}

impl EventSender for Option<ProgressSender> {
    fn send_event(&self, event: ExecutionEvent) {
        if let Some(sender) = self {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_channel() {
        let (tx, mut rx) = progress_channel();

        tx.send_event(ExecutionEvent::RunStarted {
            scheduler: SchedulerKind::Shell,
            total_jobs: 2,
        });
        tx.send_event(ExecutionEvent::info("expanding variables"));

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ExecutionEvent::RunStarted { total_jobs: 2, .. }));

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second,
            ExecutionEvent::Log {
                level: LogLevel::Info,
                ..
            }
        ));
    }

    #[test]
    fn test_optional_sender_is_a_no_op() {
        let sender: Option<ProgressSender> = None;
        sender.send_event(ExecutionEvent::info("dropped"));
    }
}
