// Command and Job Models

use crate::parser::models::SchedulerOptions;

const DEFAULT_SHELL: &str = "bash";

/// A fully substituted command string with its bookkeeping fields.
///
/// `creates` and `requires` are carried through from the input for the user's
/// benefit; no dependency information is derived from them.
#[derive(Debug, Clone, Eq)]
pub struct Command {
    pub command: String,
    pub creates: String,
    pub requires: String,
}

impl Command {
    pub fn new(command: impl Into<String>, creates: &str, requires: &str) -> Self {
        Self {
            command: command.into(),
            creates: creates.to_string(),
            requires: requires.to_string(),
        }
    }
}

impl PartialEq for Command {
    /// Two commands are the same when their substituted strings match
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command
    }
}

/// An ordered group of distinct commands submitted or run as one unit
#[derive(Debug, Clone)]
pub struct Job {
    pub commands: Vec<Command>,
    pub options: SchedulerOptions,
}

impl Job {
    pub fn new(commands: Vec<Command>, options: SchedulerOptions) -> Self {
        Self { commands, options }
    }

    /// The shell used for local dispatch of this job
    pub fn shell(&self) -> &str {
        self.options.shell.as_deref().unwrap_or(DEFAULT_SHELL)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
