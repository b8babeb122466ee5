// Experiment Input Parsing
// Reads the experiment description and normalizes it into jobs ready for
// dispatch. The file format is YAML by default; .json files hold the same
// structure.

pub mod models;

use std::path::Path;

use crate::error::{ConfigError, ExperimentResult};
use crate::jobs::{build_jobs, Job};
use crate::matrix::{variable_matrix, VariableMatrix};
use crate::parser::models::{
    yaml_to_value, ExperimentFile, JobDef, OptionValue, SchedulerOptions, SchedulerToggle,
};
use crate::scheduler::SchedulerKind;

/// Reads experiment description files
pub struct ExperimentParser;

impl ExperimentParser {
    pub fn parse_file(path: impl AsRef<Path>) -> ExperimentResult<ExperimentFile> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|source| {
                ConfigError::Json {
                    path: path.to_path_buf(),
                    source,
                }
                .into()
            }),
            _ => serde_yaml::from_str(&content).map_err(|source| {
                ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                }
                .into()
            }),
        }
    }

    pub fn parse_str(content: &str) -> Result<ExperimentFile, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

/// A fully normalized experiment, ready to dispatch
#[derive(Debug, Clone)]
pub struct Experiment {
    pub name: Option<String>,
    pub scheduler: SchedulerKind,
    pub matrix: VariableMatrix,
    pub jobs: Vec<Job>,
}

/// Expand the variable matrix, resolve the scheduler, and build the run's
/// jobs from a raw experiment file.
pub fn normalize_experiment(file: &ExperimentFile) -> ExperimentResult<Experiment> {
    let variables = file
        .variables
        .as_ref()
        .filter(|variables| !variables.is_null())
        .ok_or(ConfigError::MissingVariables)?;
    let matrix = variable_matrix(&yaml_to_value(variables))?;

    let scheduler = select_scheduler(file);
    let mut options = scheduler_options(file, scheduler);
    if options.name.is_none() {
        if let Some(name) = &file.name {
            options.name = Some(OptionValue::String(name.clone()));
        }
    }

    let defs: Vec<JobDef> = match (&file.jobs, &file.command) {
        (Some(defs), _) => defs.clone(),
        (None, Some(spec)) => vec![JobDef {
            command: spec.clone(),
        }],
        (None, None) => return Err(ConfigError::MissingCommand.into()),
    };
    let jobs = build_jobs(&defs, &matrix, &options)?;

    Ok(Experiment {
        name: file.name.clone(),
        scheduler,
        matrix,
        jobs,
    })
}

/// Pick the scheduler from the selector keys, in fixed precedence order
fn select_scheduler(file: &ExperimentFile) -> SchedulerKind {
    let enabled =
        |toggle: &Option<SchedulerToggle>| toggle.as_ref().is_some_and(SchedulerToggle::is_enabled);

    if enabled(&file.shell) {
        SchedulerKind::Shell
    } else if enabled(&file.pbs) {
        SchedulerKind::Pbs
    } else if enabled(&file.slurm) {
        SchedulerKind::Slurm
    } else {
        SchedulerKind::Shell
    }
}

fn scheduler_options(file: &ExperimentFile, scheduler: SchedulerKind) -> SchedulerOptions {
    let toggle = match scheduler {
        SchedulerKind::Shell => &file.shell,
        SchedulerKind::Pbs => &file.pbs,
        SchedulerKind::Slurm => &file.slurm,
    };
    toggle
        .as_ref()
        .filter(|toggle| toggle.is_enabled())
        .map(SchedulerToggle::options)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExperimentError;

    fn normalize(yaml: &str) -> ExperimentResult<Experiment> {
        normalize_experiment(&ExperimentParser::parse_str(yaml).unwrap())
    }

    #[test]
    fn test_minimal_experiment() {
        let experiment = normalize("command: echo {x}\nvariables:\n  x: [1, 2]").unwrap();
        assert_eq!(experiment.scheduler, SchedulerKind::Shell);
        assert_eq!(experiment.matrix.len(), 2);
        assert_eq!(experiment.jobs.len(), 1);
        let strings: Vec<&str> = experiment.jobs[0]
            .commands
            .iter()
            .map(|c| c.command.as_str())
            .collect();
        assert_eq!(strings, vec!["echo 1", "echo 2"]);
    }

    #[test]
    fn test_top_level_command_list_is_one_job() {
        let experiment =
            normalize("command:\n  - prepare {x}\n  - analyse {x}\nvariables:\n  x: [1]")
                .unwrap();
        assert_eq!(experiment.jobs.len(), 1);
        let strings: Vec<&str> = experiment.jobs[0]
            .commands
            .iter()
            .map(|c| c.command.as_str())
            .collect();
        assert_eq!(strings, vec!["prepare 1", "analyse 1"]);
    }

    #[test]
    fn test_explicit_jobs() {
        let experiment = normalize(
            "jobs:\n  - command: prepare {x}\n  - cmd: analyse {x}\nvariables:\n  x: [1, 2]",
        )
        .unwrap();
        assert_eq!(experiment.jobs.len(), 2);
        assert_eq!(experiment.jobs[1].commands[0].command, "analyse 1");
    }

    #[test]
    fn test_missing_variables_is_fatal() {
        let err = normalize("command: echo hello").unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Config(ConfigError::MissingVariables)
        ));

        // An empty key is the same as an absent one
        let err = normalize("command: echo hello\nvariables:").unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Config(ConfigError::MissingVariables)
        ));
    }

    #[test]
    fn test_missing_command_is_fatal() {
        let err = normalize("variables:\n  x: [1]").unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Config(ConfigError::MissingCommand)
        ));
    }

    #[test]
    fn test_scheduler_defaults_to_shell() {
        let experiment = normalize("command: echo 1\nvariables:\n  x: [1]").unwrap();
        assert_eq!(experiment.scheduler, SchedulerKind::Shell);
    }

    #[test]
    fn test_scheduler_selection_and_options() {
        let experiment = normalize(
            "command: echo {x}\nvariables:\n  x: [1]\npbs:\n  walltime: \"12:00\"",
        )
        .unwrap();
        assert_eq!(experiment.scheduler, SchedulerKind::Pbs);
        assert_eq!(
            experiment.jobs[0].options.walltime,
            Some(OptionValue::String("12:00".to_string()))
        );
    }

    #[test]
    fn test_shell_takes_precedence_over_pbs() {
        let experiment =
            normalize("command: echo 1\nvariables:\n  x: [1]\nshell: true\npbs: true").unwrap();
        assert_eq!(experiment.scheduler, SchedulerKind::Shell);
    }

    #[test]
    fn test_disabled_selector_falls_through() {
        let experiment =
            normalize("command: echo 1\nvariables:\n  x: [1]\nshell: false\nslurm: true")
                .unwrap();
        assert_eq!(experiment.scheduler, SchedulerKind::Slurm);
    }

    #[test]
    fn test_top_level_name_seeds_scheduler_name() {
        let experiment = normalize(
            "name: melting\ncommand: echo {x}\nvariables:\n  x: [1]\npbs: true",
        )
        .unwrap();
        assert_eq!(
            experiment.jobs[0].options.name,
            Some(OptionValue::String("melting".to_string()))
        );

        let explicit = normalize(
            "name: melting\ncommand: echo {x}\nvariables:\n  x: [1]\npbs:\n  name: crystal",
        )
        .unwrap();
        assert_eq!(
            explicit.jobs[0].options.name,
            Some(OptionValue::String("crystal".to_string()))
        );
    }

    #[test]
    fn test_parse_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("experiment.json");
        std::fs::write(
            &path,
            r#"{"command": "echo {x}", "variables": {"x": [1, 2, 3]}}"#,
        )
        .unwrap();

        let file = ExperimentParser::parse_file(&path).unwrap();
        let experiment = normalize_experiment(&file).unwrap();
        assert_eq!(experiment.matrix.len(), 3);
    }

    #[test]
    fn test_parse_missing_file() {
        let err = ExperimentParser::parse_file("does/not/exist.yml").unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Config(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_arange_tag_round_trip() {
        let experiment =
            normalize("command: run {temperature}\nvariables:\n  temperature: !arange 3")
                .unwrap();
        let strings: Vec<&str> = experiment.jobs[0]
            .commands
            .iter()
            .map(|c| c.command.as_str())
            .collect();
        assert_eq!(strings, vec!["run 0", "run 1", "run 2"]);
    }
}
