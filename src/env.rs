use crate::command::{CommandSpec, ParamType, Schema, SchemaError, validate};
use crate::parser::DEFAULT_MAX_DEPTH;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Evaluation settings of an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How deeply sub-commands may nest before the text is refused.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Immutable, validated vocabulary of commands.
///
/// Built once from host descriptors, then shared read-only: cloning is cheap
/// and the environment may be used from many threads at once. Every command
/// it holds passed validation; there is no way to add one afterwards.
///
/// Example
/// ```
/// use gribble::{Environment, Value, builtin};
/// let env = Environment::new(builtin::int_calc());
/// assert_eq!(env.run("add 5 (mul 2 6)").unwrap(), Value::Int(17));
/// ```
#[derive(Clone)]
pub struct Environment {
    commands: Arc<HashMap<String, Schema>>,
    config: Config,
}

impl Environment {
    /// Build an environment, panicking if any descriptor is defective.
    ///
    /// A bad vocabulary is a programming error, so this is meant to run at
    /// startup where it fails loudly. See [`Environment::try_new`] to report
    /// the violation instead.
    pub fn new(specs: impl IntoIterator<Item = CommandSpec>) -> Self {
        match Self::try_new(specs) {
            Ok(env) => env,
            Err(err) => {
                tracing::error!(error = %err, "invalid command vocabulary");
                panic!("invalid command vocabulary: {err}")
            }
        }
    }

    /// Build an environment, returning the first defect found.
    pub fn try_new(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, SchemaError> {
        let mut commands = HashMap::new();
        for spec in specs {
            let schema = validate(&spec)?;
            if commands.contains_key(&schema.name) {
                return Err(SchemaError::DuplicateName { name: schema.name });
            }
            commands.insert(schema.name.clone(), schema);
        }
        tracing::info!(commands = commands.len(), "command environment ready");
        Ok(Self {
            commands: Arc::new(commands),
            config: Config::default(),
        })
    }

    /// Replace the evaluation settings.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// The evaluation settings in use.
    pub fn config(&self) -> Config {
        self.config
    }

    pub(crate) fn schema(&self, name: &str) -> Option<&Schema> {
        self.commands.get(name)
    }

    /// Whether a command called `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Name and parameter types of a single command.
    pub fn signature(&self, name: &str) -> Option<Signature> {
        self.schema(name).map(Signature::of)
    }

    /// Name and parameter types of every command, sorted by name.
    pub fn signatures(&self) -> Vec<Signature> {
        let mut all: Vec<Signature> = self.commands.values().map(Signature::of).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("commands", &names)
            .field("config", &self.config)
            .finish()
    }
}

/// A command's name and its parameter types in position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<ParamType>,
}

impl Signature {
    fn of(schema: &Schema) -> Self {
        Self {
            name: schema.name.clone(),
            params: schema.params.clone(),
        }
    }
}

impl fmt::Display for Signature {
    /// `add (int) (int|float)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for param in &self.params {
            write!(f, " ({param})")?;
        }
        Ok(())
    }
}
