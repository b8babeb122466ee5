mod output;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;

use experiment_service::{
    normalize_experiment, progress_channel, ExecutionEvent, ExperimentExecutor, ExperimentParser,
    LogLevel, Submission,
};

/// Run an experiment over every combination of its variables
#[derive(Parser, Debug)]
#[command(
    name = "gridrun",
    version,
    about = "Expand an experiment file into commands and dispatch them to a shell or batch scheduler"
)]
struct Cli {
    /// Path to the experiment file
    #[arg(
        short = 'f',
        long = "input-file",
        value_name = "FILE",
        default_value = "experiment.yml"
    )]
    input_file: PathBuf,

    /// Increase output verbosity (-v shows commands, -vv shows everything)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write submission files without submitting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    output::status("Parsing", &cli.input_file.display().to_string());
    let file = ExperimentParser::parse_file(&cli.input_file)?;
    let experiment = normalize_experiment(&file)?;

    output::info(&format!(
        "{} variable combinations, {} jobs, dispatching via {}",
        experiment.matrix.len(),
        experiment.jobs.len(),
        experiment.scheduler
    ));

    // Commands run relative to the experiment file, like the file says they do
    let directory = match cli.input_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (tx, mut rx) = progress_channel();
    let mut executor = ExperimentExecutor::new(directory).with_progress(tx);
    if cli.dry_run {
        executor = executor.with_submission(Submission::Skip);
    }

    let scheduler = experiment.scheduler;
    let jobs = experiment.jobs;
    let handle = tokio::spawn(async move { executor.execute(scheduler, &jobs).await });

    let verbose = cli.verbose;
    while let Some(event) = rx.recv().await {
        render_event(&event, verbose);
    }

    let status = handle.await??;
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn render_event(event: &ExecutionEvent, verbose: u8) {
    match event {
        ExecutionEvent::RunStarted {
            scheduler,
            total_jobs,
        } => {
            output::header(&format!("Dispatching {} jobs via {}", total_jobs, scheduler));
        }
        ExecutionEvent::JobStarted {
            job_index,
            total_commands,
        } => {
            output::status(
                "Job",
                &format!("{} ({} commands)", job_index + 1, total_commands),
            );
        }
        ExecutionEvent::CommandStarted { command, .. } => {
            if verbose >= 1 {
                output::dim(&format!("$ {}", command));
            }
        }
        ExecutionEvent::CommandCompleted {
            exit_code, success, ..
        } => {
            if !success {
                output::failure(&format!(
                    "command exited with status {}",
                    exit_code.map_or_else(|| "unknown".to_string(), |code| code.to_string())
                ));
            }
        }
        ExecutionEvent::FileRemoved { path } => {
            output::dim(&format!("removing {}", path.display()));
        }
        ExecutionEvent::FileWritten { path, .. } => {
            output::status("Wrote", &path.display().to_string());
        }
        ExecutionEvent::JobSubmitted {
            job_index,
            job_id,
            depends_on,
        } => {
            output::success(&format!("submitted job {} as {}", job_index + 1, job_id));
            if verbose >= 1 && !depends_on.is_empty() {
                output::dim(&format!("  waits on {}", depends_on.join(", ")));
            }
        }
        ExecutionEvent::Log { level, message } => match level {
            LogLevel::Debug => {
                if verbose >= 2 {
                    output::dim(message);
                }
            }
            LogLevel::Info => output::info(message),
            LogLevel::Warning => output::warning(message),
            LogLevel::Error => output::error(message),
        },
        ExecutionEvent::RunCompleted { success } => {
            if *success {
                output::success("experiment complete");
            } else {
                output::failure("experiment failed");
            }
        }
    }
}
