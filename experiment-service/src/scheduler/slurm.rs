// SLURM Submission Files
// Same body shape as the pbs renderer, indexed by SLURM's array task id.

use crate::error::ConfigError;
use crate::jobs::Job;

const SLURM_FILE: &str = r#"#!/bin/bash
#SBATCH --job-name {name}
#SBATCH --nodes {nodes}
#SBATCH --cpus-per-task {cpus}
#SBATCH --mem {memory}
#SBATCH --time {walltime}
#SBATCH --array 0-{array_end}

cd "$SLURM_SUBMIT_DIR"
{setup}

COMMAND={command_list}

"${{COMMAND[$SLURM_ARRAY_TASK_ID]}}"
"#;

pub(super) fn render(job: &Job) -> Result<String, ConfigError> {
    super::fill_template(SLURM_FILE, job)
}
