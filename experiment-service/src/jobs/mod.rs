// Command Materialization
// Turns command templates and the variable matrix into deduplicated command
// sequences grouped into jobs.

pub mod models;

pub use models::{Command, Job};

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::matrix::VariableMatrix;
use crate::parser::models::{CommandSpec, JobDef, SchedulerOptions, Value};
use crate::utils::format_template;

/// Substitute every binding of the matrix into the command templates.
///
/// Bindings are the outer dimension, templates the inner one. Commands that
/// substitute to the same string collapse to the first occurrence.
pub fn materialize(spec: &CommandSpec, matrix: &VariableMatrix) -> Result<Vec<Command>, ConfigError> {
    let templates = spec.templates().ok_or(ConfigError::MissingCommand)?;
    let creates = spec.creates();
    let requires = spec.requires();

    let mut seen: HashSet<String> = HashSet::new();
    let mut commands = Vec::new();

    for binding in matrix {
        for template in &templates {
            let rendered = format_template(template, |name| {
                binding.get(name).map(Value::as_string)
            })
            .map_err(|name| ConfigError::UnboundVariable {
                name,
                template: template.to_string(),
            })?;

            if seen.insert(rendered.clone()) {
                commands.push(Command::new(rendered, creates, requires));
            }
        }
    }

    Ok(commands)
}

/// Build one job per definition, all sharing the run's scheduler options
pub fn build_jobs(
    defs: &[JobDef],
    matrix: &VariableMatrix,
    options: &SchedulerOptions,
) -> Result<Vec<Job>, ConfigError> {
    let mut jobs = Vec::with_capacity(defs.len());
    for def in defs {
        let commands = materialize(&def.command, matrix)?;
        jobs.push(Job::new(commands, options.clone()));
    }
    Ok(jobs)
}
