// Experiment Executor
// Sequential dispatch of jobs, either directly in a shell or as submission
// files chained through a batch queue. Everything runs strictly in order;
// the dependency chain and fail-fast behavior rely on it.

use std::path::PathBuf;

use which::which;

use crate::error::{EnvironmentError, ExecutionError, ExperimentResult};
use crate::execution::events::{EventSender, ExecutionEvent, ProgressSender};
use crate::jobs::Job;
use crate::scheduler::{render, SchedulerKind, DEFAULT_NAME};

/// Outcome of a dispatched run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Succeeded)
    }
}

/// How batch submission files are handed to the queue
#[derive(Debug, Clone, Default)]
pub enum Submission {
    /// Locate the scheduler's submit command on the path; fall back to
    /// file generation with a warning when it is missing
    #[default]
    Auto,
    /// Use a specific submit executable
    Command(PathBuf),
    /// Write submission files without submitting anything
    Skip,
}

/// Drives a run's jobs in order
pub struct ExperimentExecutor {
    directory: PathBuf,
    basename: Option<String>,
    submission: Submission,
    progress: Option<ProgressSender>,
}

impl ExperimentExecutor {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            basename: None,
            submission: Submission::Auto,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = Some(basename.into());
        self
    }

    pub fn with_submission(mut self, submission: Submission) -> Self {
        self.submission = submission;
        self
    }

    /// Dispatch every job. Configuration and environment problems surface as
    /// errors; command and submission failures end the run with
    /// `RunStatus::Failed` after an error event.
    pub async fn execute(
        &self,
        scheduler: SchedulerKind,
        jobs: &[Job],
    ) -> ExperimentResult<RunStatus> {
        self.progress.send_event(ExecutionEvent::RunStarted {
            scheduler,
            total_jobs: jobs.len(),
        });

        let result = match scheduler {
            SchedulerKind::Shell => self.run_shell_jobs(jobs).await,
            batch => self.run_batch_jobs(batch, jobs).await,
        };

        let success = matches!(&result, Ok(status) if status.is_success());
        self.progress
            .send_event(ExecutionEvent::RunCompleted { success });
        result
    }

    /// Run each command of each job in the shell, stopping the whole run at
    /// the first non-zero exit status.
    async fn run_shell_jobs(&self, jobs: &[Job]) -> ExperimentResult<RunStatus> {
        for (job_index, job) in jobs.iter().enumerate() {
            let shell = job.shell();
            if which(shell).is_err() {
                return Err(EnvironmentError::ShellNotFound(shell.to_string()).into());
            }

            self.progress.send_event(ExecutionEvent::JobStarted {
                job_index,
                total_commands: job.len(),
            });

            for (command_index, command) in job.commands.iter().enumerate() {
                self.progress.send_event(ExecutionEvent::CommandStarted {
                    job_index,
                    command_index,
                    command: command.command.clone(),
                });

                let status = tokio::process::Command::new(shell)
                    .arg("-c")
                    .arg(&command.command)
                    .current_dir(&self.directory)
                    .status()
                    .await
                    .map_err(|source| ExecutionError::SpawnFailed {
                        command: command.command.clone(),
                        source,
                    })?;

                let success = status.success();
                self.progress.send_event(ExecutionEvent::CommandCompleted {
                    job_index,
                    command_index,
                    exit_code: status.code(),
                    success,
                });

                if !success {
                    let failure = ExecutionError::CommandFailed {
                        command: command.command.clone(),
                        status: status.code().unwrap_or(-1),
                    };
                    self.progress
                        .send_event(ExecutionEvent::error(failure.to_string()));
                    return Ok(RunStatus::Failed);
                }
            }
        }
        Ok(RunStatus::Succeeded)
    }

    /// Write one submission file per job and chain submissions so each job
    /// waits on every previously submitted one.
    async fn run_batch_jobs(
        &self,
        kind: SchedulerKind,
        jobs: &[Job],
    ) -> ExperimentResult<RunStatus> {
        let Some(ext) = kind.file_extension() else {
            return Err(crate::error::ConfigError::UnsupportedScheduler(kind.to_string()).into());
        };
        let Some(submit_name) = kind.submit_command() else {
            return Err(crate::error::ConfigError::UnsupportedScheduler(kind.to_string()).into());
        };

        let basename = self.basename_for(jobs);
        self.remove_stale_files(&basename, ext).await?;

        let submit: Option<PathBuf> = match &self.submission {
            Submission::Skip => {
                self.progress
                    .send_event(ExecutionEvent::info("submission disabled; writing files only"));
                None
            }
            Submission::Command(path) => Some(path.clone()),
            Submission::Auto => match which(submit_name) {
                Ok(path) => Some(path),
                Err(_) => {
                    let missing = EnvironmentError::SubmitNotFound(submit_name.to_string());
                    self.progress.send_event(ExecutionEvent::warning(format!(
                        "{}; writing submission files without submitting",
                        missing
                    )));
                    None
                }
            },
        };

        let mut job_ids: Vec<String> = Vec::new();
        for (job_index, job) in jobs.iter().enumerate() {
            let content = render(kind, job)?;
            let file_name = format!("{}_{:02}.{}", basename, job_index, ext);
            let path = self.directory.join(&file_name);
            tokio::fs::write(&path, &content)
                .await
                .map_err(|source| ExecutionError::Io {
                    path: path.clone(),
                    source,
                })?;
            self.progress.send_event(ExecutionEvent::FileWritten {
                path: path.clone(),
                job_index,
            });

            let Some(submit) = &submit else { continue };

            let mut command = tokio::process::Command::new(submit);
            if !job_ids.is_empty() {
                command.args(kind.dependency_arguments(&job_ids));
            }
            let output = command
                .arg(&file_name)
                .current_dir(&self.directory)
                .output()
                .await
                .map_err(|source| ExecutionError::SpawnFailed {
                    command: submit.display().to_string(),
                    source,
                })?;

            if !output.status.success() {
                let failure = ExecutionError::SubmissionFailed {
                    index: job_index,
                    detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                };
                self.progress
                    .send_event(ExecutionEvent::error(failure.to_string()));
                return Ok(RunStatus::Failed);
            }

            let job_id = kind.parse_job_id(&String::from_utf8_lossy(&output.stdout));
            self.progress.send_event(ExecutionEvent::JobSubmitted {
                job_index,
                job_id: job_id.clone(),
                depends_on: job_ids.clone(),
            });
            job_ids.push(job_id);
        }

        Ok(RunStatus::Succeeded)
    }

    fn basename_for(&self, jobs: &[Job]) -> String {
        if let Some(basename) = &self.basename {
            return basename.clone();
        }
        jobs.first()
            .and_then(|job| job.options.name.as_ref())
            .map(|name| name.to_string())
            .unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    /// Delete leftovers of a previous run so re-runs start clean
    async fn remove_stale_files(&self, basename: &str, ext: &str) -> ExperimentResult<()> {
        let mut entries = tokio::fs::read_dir(&self.directory)
            .await
            .map_err(|source| ExecutionError::Io {
                path: self.directory.clone(),
                source,
            })?;

        let prefix = format!("{}_", basename);
        let suffix = format!(".{}", ext);
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ExecutionError::Io {
                path: self.directory.clone(),
                source,
            })?
        {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if file_name.starts_with(&prefix) && file_name.ends_with(&suffix) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|source| ExecutionError::Io {
                        path: path.clone(),
                        source,
                    })?;
                self.progress
                    .send_event(ExecutionEvent::FileRemoved { path });
            }
        }
        Ok(())
    }
}
