use crate::command::{Args, ExecutableCommand, ParamType};
use crate::env::Environment;
use crate::lexer::SyntaxError;
use crate::parser::{self, Call, CallNode};
use crate::value::{Value, ValueType};
use regex::Regex;
use std::sync::LazyLock;

/// Everything that can go wrong because of the command text.
///
/// These never indicate a defect in the vocabulary; those panic instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("command `{name}` takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("command `{name}`: argument {position} must be {expected}, got {got}")]
    ArgType {
        name: String,
        position: usize,
        expected: ParamType,
        got: ValueType,
    },
}

impl Environment {
    /// Parse and evaluate `text`.
    ///
    /// Returns the first error encountered, with no partial result.
    pub fn run(&self, text: &str) -> Result<Value, UserError> {
        let root = parser::parse_with_depth(text, self.config().max_depth)?;
        call(root, self)
    }

    /// Parse `text` and bind its top-level command without running it.
    ///
    /// Sub-commands used as arguments are evaluated, since their results are
    /// the arguments being bound.
    pub fn command(&self, text: &str) -> Result<Box<dyn ExecutableCommand>, UserError> {
        let root = parser::parse_with_depth(text, self.config().max_depth)?;
        bind(root, self)
    }

    /// Best-effort name of the command `text` starts with.
    ///
    /// Works on text that fails to parse, so a host can show usage for the
    /// command a user was attempting. The name is not checked against the
    /// environment.
    pub fn command_name<'t>(&self, text: &'t str) -> Option<&'t str> {
        command_name(text)
    }
}

/// Evaluate a call tree against `env`, consuming it.
pub fn evaluate(root: CallNode, env: &Environment) -> Result<Value, UserError> {
    match root {
        CallNode::Literal(value) => Ok(value),
        CallNode::Call(c) => call(c, env),
    }
}

fn call(c: Call, env: &Environment) -> Result<Value, UserError> {
    let name = c.name.clone();
    let command = bind(c, env)?;
    tracing::debug!(command = %name, "executing command");
    match Value::from_output(command.execute()) {
        Ok(value) => Ok(value),
        Err(_) => {
            tracing::error!(command = %name, "command returned an unsupported type");
            panic!(
                "return type violation: command `{name}` returned a value that is not an int, float or string"
            )
        }
    }
}

/// Resolve, check and evaluate arguments, then hand them to the binder.
fn bind(c: Call, env: &Environment) -> Result<Box<dyn ExecutableCommand>, UserError> {
    let Call { name, args } = c;
    let Some(schema) = env.schema(&name) else {
        return Err(UserError::UnknownCommand(name));
    };
    if args.len() != schema.params.len() {
        return Err(UserError::Arity {
            name,
            expected: schema.params.len(),
            got: args.len(),
        });
    }

    let mut values = Vec::with_capacity(args.len());
    for (index, (arg, param)) in args.into_iter().zip(&schema.params).enumerate() {
        let value = evaluate(arg, env)?;
        let got = value.value_type();
        if !param.accepts(got) {
            return Err(UserError::ArgType {
                name,
                position: index + 1,
                expected: param.clone(),
                got,
            });
        }
        values.push(value);
    }

    Ok((schema.binder)(Args::new(name, values)))
}

static LEADING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\(?\s*([\p{Alphabetic}_][\p{Alphabetic}\p{N}_]*)")
        .expect("leading name pattern is valid")
});

/// Best-effort name of the command `text` starts with, see
/// [`Environment::command_name`].
pub fn command_name(text: &str) -> Option<&str> {
    LEADING_NAME
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
