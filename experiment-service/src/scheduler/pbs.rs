// PBS Submission Files
// Renders a job into a .pbs file using the job array feature: one array
// index per command.

use crate::error::ConfigError;
use crate::jobs::Job;

const PBS_FILE: &str = r#"#!/bin/bash
#PBS -N {name}
#PBS -l select={nodes}:ncpus={cpus}:memory={memory}
#PBS -l walltime={walltime}
#PBS -J 0-{array_end}

cd "$PBS_O_WORKDIR"
{setup}

COMMAND={command_list}

"${{COMMAND[$PBS_ARRAY_INDEX]}}"
"#;

pub(super) fn render(job: &Job) -> Result<String, ConfigError> {
    super::fill_template(PBS_FILE, job)
}
