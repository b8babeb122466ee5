// Scheduler File Rendering
// Pure rendering of batch submission files from a job and its options.

mod pbs;
mod slurm;

use std::fmt;

use crate::error::ConfigError;
use crate::jobs::Job;
use crate::parser::models::{yaml_to_value, OptionValue, SchedulerOptions, Setup};

pub const DEFAULT_NAME: &str = "experi";
const DEFAULT_WALLTIME: &str = "1:00";
const DEFAULT_CPUS: &str = "1";
const DEFAULT_NODES: &str = "1";
const DEFAULT_MEMORY: &str = "4gb";

/// Where a run's jobs are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Shell,
    Pbs,
    Slurm,
}

impl SchedulerKind {
    /// Extension of the submission files this scheduler consumes
    pub fn file_extension(&self) -> Option<&'static str> {
        match self {
            SchedulerKind::Shell => None,
            SchedulerKind::Pbs => Some("pbs"),
            SchedulerKind::Slurm => Some("slurm"),
        }
    }

    /// Executable used to submit a rendered file to the queue
    pub fn submit_command(&self) -> Option<&'static str> {
        match self {
            SchedulerKind::Shell => None,
            SchedulerKind::Pbs => Some("qsub"),
            SchedulerKind::Slurm => Some("sbatch"),
        }
    }

    /// Arguments deferring a submission until every job in `ids` succeeded
    pub fn dependency_arguments(&self, ids: &[String]) -> Vec<String> {
        match self {
            SchedulerKind::Shell => Vec::new(),
            SchedulerKind::Pbs => vec![
                "-W".to_string(),
                format!("depend=afterok:{}", ids.join(":")),
            ],
            SchedulerKind::Slurm => {
                vec![format!("--dependency=afterok:{}", ids.join(":"))]
            }
        }
    }

    /// Extract the job identifier from the submit command's stdout.
    ///
    /// qsub prints the id alone; sbatch prints "Submitted batch job N".
    pub fn parse_job_id(&self, stdout: &str) -> String {
        let line = stdout.trim();
        match self {
            SchedulerKind::Slurm => line
                .rsplit(char::is_whitespace)
                .next()
                .unwrap_or(line)
                .to_string(),
            _ => line.to_string(),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerKind::Shell => "shell",
            SchedulerKind::Pbs => "pbs",
            SchedulerKind::Slurm => "slurm",
        };
        write!(f, "{}", name)
    }
}

/// Render the submission file for one job
pub fn render(kind: SchedulerKind, job: &Job) -> Result<String, ConfigError> {
    match kind {
        SchedulerKind::Pbs => pbs::render(job),
        SchedulerKind::Slurm => slurm::render(job),
        SchedulerKind::Shell => Err(ConfigError::UnsupportedScheduler("shell".to_string())),
    }
}

/// Resolve scheduler options against the defaults, keeping pass-through keys
fn resolved_options(options: &SchedulerOptions) -> Vec<(String, String)> {
    let field = |value: &Option<OptionValue>, default: &str| {
        value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| default.to_string())
    };

    let mut resolved = vec![
        ("name".to_string(), field(&options.name, DEFAULT_NAME)),
        (
            "walltime".to_string(),
            field(&options.walltime, DEFAULT_WALLTIME),
        ),
        ("cpus".to_string(), field(&options.cpus, DEFAULT_CPUS)),
        ("nodes".to_string(), field(&options.nodes, DEFAULT_NODES)),
        ("memory".to_string(), field(&options.memory, DEFAULT_MEMORY)),
        (
            "setup".to_string(),
            options.setup.as_ref().map(Setup::to_block).unwrap_or_default(),
        ),
    ];
    for (key, value) in &options.extra {
        resolved.push((key.clone(), yaml_to_value(value).as_string()));
    }
    resolved
}

/// The job's commands as a bash array literal, one element per line
fn commands_as_bash_array(job: &Job) -> String {
    let mut array = String::from("( \\\n");
    for command in &job.commands {
        array.push('"');
        array.push_str(&command.command);
        array.push_str("\" \\\n");
    }
    array.push(')');
    array
}

/// Shared substitution driver for the per-scheduler templates
fn fill_template(template: &str, job: &Job) -> Result<String, ConfigError> {
    let options = resolved_options(&job.options);
    let array_end = job.commands.len().saturating_sub(1).to_string();
    let command_list = commands_as_bash_array(job);

    crate::utils::format_template(template, |key| match key {
        "array_end" => Some(array_end.clone()),
        "command_list" => Some(command_list.clone()),
        other => options
            .iter()
            .find(|(name, _)| name.as_str() == other)
            .map(|(_, value)| value.clone()),
    })
    .map_err(|name| ConfigError::UnboundVariable {
        name,
        template: "scheduler submission file".to_string(),
    })
}
