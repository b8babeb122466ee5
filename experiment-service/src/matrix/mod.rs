// Variable Matrix Expansion
// Recursively expands the "variables" tree into the ordered set of concrete
// variable combinations an experiment runs over.

use crate::error::ConfigError;
use crate::parser::models::Value;

/// The full expansion of a variable tree
pub type VariableMatrix = Vec<Binding>;

/// Reserved mapping keys, evaluated in this order when several coexist
const COMBINATOR_KEYS: [&str; 4] = ["zip", "product", "arange", "combine"];

/// How sibling variable dimensions are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Full cartesian cross join (the default)
    Product,
    /// Positional pairing; all dimensions must have equal length
    Zip,
}

/// One concrete assignment of values to variable names.
///
/// Entries keep insertion order for deterministic iteration; merging favors
/// the earlier binding when both define a name.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    entries: Vec<(String, Value)>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, keeping any existing value for the same name
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if !self.contains(&name) {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key-union merge of two bindings; `self` wins collisions
    pub fn merged(&self, other: &Binding) -> Binding {
        let mut merged = self.clone();
        for (name, value) in &other.entries {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

impl PartialEq for Binding {
    /// Equality ignores entry order
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl FromIterator<(String, Value)> for Binding {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut binding = Binding::new();
        for (name, value) in iter {
            binding.insert(name, value);
        }
        binding
    }
}

/// Expand a variable tree into the full matrix, validating the result.
///
/// An empty expansion and a matrix where some combination misses a variable
/// name are both configuration errors.
pub fn variable_matrix(tree: &Value) -> Result<VariableMatrix, ConfigError> {
    let matrix = expand(tree, None, MergeMode::Product)?;
    if matrix.is_empty() {
        return Err(ConfigError::EmptyMatrix);
    }

    let mut names: Vec<&str> = Vec::new();
    for binding in &matrix {
        for (name, _) in binding.iter() {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
    }
    for (index, binding) in matrix.iter().enumerate() {
        for name in &names {
            if !binding.contains(name) {
                return Err(ConfigError::IncompleteBinding {
                    name: name.to_string(),
                    index,
                });
            }
        }
    }

    Ok(matrix)
}

/// Recursively expand one node of the variable tree.
///
/// `parent` is the variable name the node's scalars bind to; `mode` is the
/// ambient merge rule for sibling keys.
pub fn expand(
    tree: &Value,
    parent: Option<&str>,
    mode: MergeMode,
) -> Result<VariableMatrix, ConfigError> {
    match tree {
        Value::Object(entries) => expand_mapping(entries, parent, mode),
        Value::Array(items) => {
            // Enumerated discrete values: expand each element and concatenate
            let mut matrix = Vec::new();
            for item in items {
                matrix.extend(expand(item, parent, mode)?);
            }
            Ok(matrix)
        }
        scalar => {
            let name = parent
                .ok_or_else(|| ConfigError::MissingParentKey("a scalar value".to_string()))?;
            let mut binding = Binding::new();
            binding.insert(name, scalar.clone());
            Ok(vec![binding])
        }
    }
}

fn expand_mapping(
    entries: &[(String, Value)],
    parent: Option<&str>,
    mode: MergeMode,
) -> Result<VariableMatrix, ConfigError> {
    let mut groups: Vec<VariableMatrix> = Vec::new();
    let mut mode = mode;

    // First pass: combinator keys, in their fixed evaluation order
    for key in COMBINATOR_KEYS {
        let Some((_, value)) = entries.iter().find(|(name, _)| name.as_str() == key) else {
            continue;
        };
        match key {
            "zip" => match value {
                Value::Array(items) => {
                    // A list of sibling trees pairs up positionally and joins
                    // the sibling set as a single dimension
                    let mut zipped = Vec::with_capacity(items.len());
                    for item in items {
                        zipped.push(expand(item, parent, MergeMode::Zip)?);
                    }
                    groups.push(merge_groups(zipped, MergeMode::Zip)?);
                }
                other => groups.push(expand(other, parent, MergeMode::Zip)?),
            },
            "product" => match value {
                Value::Array(_) => {
                    return Err(ConfigError::InvalidCombinatorArguments {
                        combinator: "product".to_string(),
                        reason: "takes a mapping of values, not a list".to_string(),
                    })
                }
                other => groups.push(expand(other, parent, MergeMode::Product)?),
            },
            "arange" => groups.push(expand_arange(value, parent)?),
            "combine" => {
                let Value::Array(items) = value else {
                    return Err(ConfigError::InvalidCombinatorArguments {
                        combinator: "combine".to_string(),
                        reason: "takes a list of arguments".to_string(),
                    });
                };
                for item in items {
                    groups.push(expand(item, parent, MergeMode::Product)?);
                }
                // combine is zip-of-products: remaining siblings pair up
                mode = MergeMode::Zip;
            }
            _ => unreachable!(),
        }
    }

    // Second pass: ordinary variable names, in input order
    for (key, value) in entries {
        if COMBINATOR_KEYS.contains(&key.as_str()) {
            continue;
        }
        // Legacy alias: `name: {value: X}` binds X directly under `name`
        let child_parent = if key == "value" && parent.is_some() {
            parent
        } else {
            Some(key.as_str())
        };
        groups.push(expand(value, child_parent, mode)?);
    }

    merge_groups(groups, mode)
}

fn expand_arange(value: &Value, parent: Option<&str>) -> Result<VariableMatrix, ConfigError> {
    let name = parent.ok_or_else(|| ConfigError::MissingParentKey("arange".to_string()))?;

    let invalid = |reason: &str| ConfigError::InvalidCombinatorArguments {
        combinator: "arange".to_string(),
        reason: reason.to_string(),
    };

    let (start, stop, step) = match value {
        Value::Number(stop) => (0.0, *stop, 1.0),
        Value::Object(_) => {
            let stop = value
                .get("stop")
                .and_then(Value::as_number)
                .ok_or_else(|| invalid("requires a numeric \"stop\" value"))?;
            let start = match value.get("start") {
                None => 0.0,
                Some(v) => v
                    .as_number()
                    .ok_or_else(|| invalid("has a non-numeric \"start\" value"))?,
            };
            let step = match value.get("step") {
                None => 1.0,
                Some(v) => v
                    .as_number()
                    .ok_or_else(|| invalid("has a non-numeric \"step\" value"))?,
            };
            (start, stop, step)
        }
        _ => return Err(invalid("takes a number or a mapping")),
    };

    if step == 0.0 {
        return Err(invalid("must have a non-zero \"step\""));
    }

    let mut matrix = Vec::new();
    let mut current = start;
    while (step > 0.0 && current < stop) || (step < 0.0 && current > stop) {
        let mut binding = Binding::new();
        binding.insert(name, Value::Number(current));
        matrix.push(binding);
        current += step;
    }
    Ok(matrix)
}

/// Merge sibling binding groups under the given mode.
///
/// Product over no groups is the single empty binding; zip over no groups is
/// empty.
fn merge_groups(groups: Vec<VariableMatrix>, mode: MergeMode) -> Result<VariableMatrix, ConfigError> {
    match mode {
        MergeMode::Product => {
            let mut matrix = vec![Binding::new()];
            for group in &groups {
                let mut next = Vec::with_capacity(matrix.len() * group.len());
                for base in &matrix {
                    for item in group {
                        next.push(base.merged(item));
                    }
                }
                matrix = next;
            }
            Ok(matrix)
        }
        MergeMode::Zip => {
            let Some(first) = groups.first() else {
                return Ok(Vec::new());
            };
            let expected = first.len();
            for group in &groups {
                if group.len() != expected {
                    return Err(ConfigError::ZipLengthMismatch {
                        expected,
                        found: group.len(),
                    });
                }
            }
            let mut matrix = Vec::with_capacity(expected);
            for index in 0..expected {
                let mut merged = Binding::new();
                for group in &groups {
                    merged = merged.merged(&group[index]);
                }
                matrix.push(merged);
            }
            Ok(matrix)
        }
    }
}
