// Experiment Input Models
// Typed view of the experiment description plus the nested value tree the
// variable-matrix engine consumes.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// A nested value from the experiment description.
///
/// `Object` keeps its entries in input order; the matrix engine depends on
/// deterministic key iteration.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Render a scalar the way it appears in a command line. Whole numbers
    /// drop their fractional part, matching YAML's integer literals.
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            Value::String(s) => s.clone(),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::as_string).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Object(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.as_string()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Look up a key on an `Object`; `None` for every other variant.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries
                .iter()
                .find(|(name, _)| name.as_str() == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

/// Convert a raw `serde_yaml::Value` into the ordered value tree.
///
/// The `!arange` tag is shorthand for an `arange` mapping, kept from the
/// original input format.
pub fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            Value::Number(n.as_f64().unwrap_or(n.as_i64().unwrap_or(0) as f64))
        }
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.iter()
                .filter_map(|(k, v)| k.as_str().map(|key| (key.to_string(), yaml_to_value(v))))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            if tag.trim_start_matches('!') == "arange" {
                Value::Object(vec![("arange".to_string(), yaml_to_value(&tagged.value))])
            } else {
                yaml_to_value(&tagged.value)
            }
        }
    }
}

/// Raw experiment file as deserialized, before normalization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperimentFile {
    #[serde(default)]
    pub name: Option<String>,

    /// The variable tree; required, but checked during normalization so the
    /// error carries context rather than a bare serde message.
    #[serde(default)]
    pub variables: Option<serde_yaml::Value>,

    /// Top-level command template(s); ignored when `jobs` is present
    #[serde(default)]
    pub command: Option<CommandSpec>,

    /// Explicit job definitions, each with its own command spec
    #[serde(default)]
    pub jobs: Option<Vec<JobDef>>,

    #[serde(default)]
    pub shell: Option<SchedulerToggle>,

    #[serde(default)]
    pub pbs: Option<SchedulerToggle>,

    #[serde(default)]
    pub slurm: Option<SchedulerToggle>,
}

/// A command template: a single string, a list of strings, or a record
/// carrying `creates`/`requires` bookkeeping alongside the template(s).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Single(String),
    Many(Vec<String>),
    Detailed {
        #[serde(default, alias = "cmd")]
        command: Option<Templates>,
        #[serde(default)]
        creates: Option<String>,
        #[serde(default)]
        requires: Option<String>,
    },
}

impl CommandSpec {
    /// The template strings of this spec, in declared order
    pub fn templates(&self) -> Option<Vec<&str>> {
        match self {
            CommandSpec::Single(s) => Some(vec![s.as_str()]),
            CommandSpec::Many(list) => Some(list.iter().map(String::as_str).collect()),
            CommandSpec::Detailed { command, .. } => {
                command.as_ref().map(|templates| templates.as_slice())
            }
        }
    }

    pub fn creates(&self) -> &str {
        match self {
            CommandSpec::Detailed {
                creates: Some(creates),
                ..
            } => creates,
            _ => "",
        }
    }

    pub fn requires(&self) -> &str {
        match self {
            CommandSpec::Detailed {
                requires: Some(requires),
                ..
            } => requires,
            _ => "",
        }
    }
}

/// One or several template strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Templates {
    Single(String),
    Many(Vec<String>),
}

impl Templates {
    fn as_slice(&self) -> Vec<&str> {
        match self {
            Templates::Single(s) => vec![s.as_str()],
            Templates::Many(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

/// One entry of the `jobs` list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobDef {
    #[serde(alias = "cmd")]
    pub command: CommandSpec,
}

/// A scheduler selector value: `true`/`false` or an options mapping
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchedulerToggle {
    Flag(bool),
    Options(SchedulerOptions),
}

impl SchedulerToggle {
    /// Mirrors the truthiness rule of the original input format: `false` and
    /// an empty options mapping do not select the scheduler.
    pub fn is_enabled(&self) -> bool {
        match self {
            SchedulerToggle::Flag(enabled) => *enabled,
            SchedulerToggle::Options(options) => !options.is_empty(),
        }
    }

    pub fn options(&self) -> SchedulerOptions {
        match self {
            SchedulerToggle::Flag(_) => SchedulerOptions::default(),
            SchedulerToggle::Options(options) => options.clone(),
        }
    }
}

/// Options attached to every job of a run. Missing fields fall back to
/// defaults at render time; unrecognized keys are kept so a template that
/// references them can substitute them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchedulerOptions {
    #[serde(default)]
    pub name: Option<OptionValue>,

    #[serde(default)]
    pub walltime: Option<OptionValue>,

    #[serde(default)]
    pub cpus: Option<OptionValue>,

    #[serde(default)]
    pub nodes: Option<OptionValue>,

    #[serde(default)]
    pub memory: Option<OptionValue>,

    #[serde(default)]
    pub setup: Option<Setup>,

    /// Shell executable for local dispatch
    #[serde(default)]
    pub shell: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl SchedulerOptions {
    pub fn is_empty(&self) -> bool {
        *self == SchedulerOptions::default()
    }
}

/// A scheduler option value as written: string or number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    String(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "{}", s),
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Float(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

/// Setup commands run before the job body: one string or a list joined by
/// newlines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Setup {
    Single(String),
    Many(Vec<String>),
}

impl Setup {
    pub fn to_block(&self) -> String {
        match self {
            Setup::Single(s) => s.clone(),
            Setup::Many(lines) => lines.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_as_string_formats_whole_numbers() {
        assert_eq!(Value::Number(3.0).as_string(), "3");
        assert_eq!(Value::Number(0.25).as_string(), "0.25");
        assert_eq!(Value::String("spam".to_string()).as_string(), "spam");
        assert_eq!(Value::Null.as_string(), "");
    }

    #[test]
    fn test_yaml_to_value_preserves_key_order() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("zeta: 1\nalpha: 2\nmid: 3").unwrap();
        let value = yaml_to_value(&yaml);
        let Value::Object(entries) = value else {
            panic!("expected an object");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_yaml_to_value_arange_tag() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("temperature: !arange 3").unwrap();
        let value = yaml_to_value(&yaml);
        assert_eq!(
            value.get("temperature").and_then(|v| v.get("arange")),
            Some(&Value::Number(3.0))
        );
    }

    #[test]
    fn test_command_spec_forms() {
        let single: CommandSpec = serde_yaml::from_str("echo hello").unwrap();
        assert_eq!(single.templates(), Some(vec!["echo hello"]));

        let many: CommandSpec = serde_yaml::from_str("- echo one\n- echo two").unwrap();
        assert_eq!(many.templates(), Some(vec!["echo one", "echo two"]));

        let detailed: CommandSpec =
            serde_yaml::from_str("cmd: echo {x}\ncreates: out.txt\nrequires: in.txt").unwrap();
        assert_eq!(detailed.templates(), Some(vec!["echo {x}"]));
        assert_eq!(detailed.creates(), "out.txt");
        assert_eq!(detailed.requires(), "in.txt");
    }

    #[test]
    fn test_scheduler_toggle_truthiness() {
        let enabled: SchedulerToggle = serde_yaml::from_str("true").unwrap();
        assert!(enabled.is_enabled());

        let disabled: SchedulerToggle = serde_yaml::from_str("false").unwrap();
        assert!(!disabled.is_enabled());

        let empty: SchedulerToggle = serde_yaml::from_str("{}").unwrap();
        assert!(!empty.is_enabled());

        let options: SchedulerToggle = serde_yaml::from_str("walltime: \"4:00\"").unwrap();
        assert!(options.is_enabled());
        assert_eq!(
            options.options().walltime,
            Some(OptionValue::String("4:00".to_string()))
        );
    }

    #[test]
    fn test_scheduler_options_keeps_unknown_keys() {
        let options: SchedulerOptions =
            serde_yaml::from_str("cpus: 8\nqueue: express").unwrap();
        assert_eq!(options.cpus, Some(OptionValue::Int(8)));
        assert!(options.extra.contains_key("queue"));
    }

    #[test]
    fn test_setup_block() {
        let single: Setup = serde_yaml::from_str("module load gcc").unwrap();
        assert_eq!(single.to_block(), "module load gcc");

        let many: Setup = serde_yaml::from_str("- module load gcc\n- export N=1").unwrap();
        assert_eq!(many.to_block(), "module load gcc\nexport N=1");
    }
}
