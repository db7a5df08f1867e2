use crate::lexer::{Lexer, Token};
use crate::value::{Output, Value, ValueType};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Object-safe trait for a bound command instance, ready to run.
///
/// This is implemented by built-ins via a blanket impl, and can be implemented
/// directly by anything a binder returns.
pub trait ExecutableCommand {
    /// Executes the command and hands back its result.
    ///
    /// The concrete type inside the returned box must be one the language
    /// knows about (see [`Output`]); anything else aborts evaluation.
    fn execute(self: Box<Self>) -> Output;
}

/// Commands declared as plain Rust structs.
///
/// The struct describes its own parameters, builds itself from the checked
/// arguments, and runs. Register it with [`CommandSpec::of`].
pub trait BuiltinCommand: Sized + 'static {
    /// Canonical name of the command, e.g. "add".
    fn name() -> &'static str;

    /// Declared parameters, see [`ParamSpec`].
    fn params() -> Vec<ParamSpec>;

    /// Build an instance from arguments that already match [`Self::params`].
    fn bind(args: Args) -> Self;

    fn run(self) -> Output;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>) -> Output {
        T::run(*self)
    }
}

/// The argument values of one invocation, in position order.
///
/// Every value has already been checked against its parameter's declared
/// type. Reading a value as a type its parameter could never hold is a bug in
/// the binder and panics.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    command: String,
    values: Vec<Value>,
}

impl Args {
    pub(crate) fn new(command: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            command: command.into(),
            values,
        }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at a 1-based `position`.
    pub fn value(&self, position: usize) -> &Value {
        match position.checked_sub(1).and_then(|i| self.values.get(i)) {
            Some(value) => value,
            None => panic!(
                "command `{}` has {} parameter(s) but its binder read position {}",
                self.command,
                self.values.len(),
                position
            ),
        }
    }

    /// Read an `int` argument.
    pub fn int(&self, position: usize) -> i64 {
        match self.value(position) {
            Value::Int(v) => *v,
            other => self.misread(position, ValueType::Int, other),
        }
    }

    /// Read a `float` argument.
    pub fn float(&self, position: usize) -> f64 {
        match self.value(position) {
            Value::Float(v) => *v,
            other => self.misread(position, ValueType::Float, other),
        }
    }

    /// Read a `string` argument.
    pub fn string(&self, position: usize) -> String {
        match self.value(position) {
            Value::String(v) => v.clone(),
            other => self.misread(position, ValueType::String, other),
        }
    }

    /// Read an `int` or `float` argument as `f64`.
    pub fn number(&self, position: usize) -> f64 {
        match self.value(position) {
            Value::Int(v) => *v as f64,
            Value::Float(v) => *v,
            other => self.misread(position, ValueType::Float, other),
        }
    }

    /// All argument values, in position order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn misread(&self, position: usize, wanted: ValueType, found: &Value) -> ! {
        panic!(
            "command `{}`: binder read parameter {} as {} but it holds {}",
            self.command,
            position,
            wanted,
            found.value_type()
        )
    }
}

/// One parameter's declaration, as supplied by the host.
///
/// `ty` names the type: `int`, `float`, `string`, or `any`. An `any` parameter
/// lists the types it accepts in `types`, comma separated (`"int,float"`).
/// Declarations are checked when the [`Environment`](crate::env::Environment)
/// is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// 1-based position of the argument.
    pub position: usize,
    pub ty: String,
    pub types: Option<String>,
}

impl ParamSpec {
    pub fn new(position: usize, ty: impl Into<String>) -> Self {
        Self {
            position,
            ty: ty.into(),
            types: None,
        }
    }

    pub fn int(position: usize) -> Self {
        Self::new(position, "int")
    }

    pub fn float(position: usize) -> Self {
        Self::new(position, "float")
    }

    pub fn string(position: usize) -> Self {
        Self::new(position, "string")
    }

    /// An `any` parameter accepting the comma separated `types`.
    pub fn any(position: usize, types: impl Into<String>) -> Self {
        Self {
            position,
            ty: ANY.to_string(),
            types: Some(types.into()),
        }
    }
}

const ANY: &str = "any";

/// A validated parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Fixed(ValueType),
    /// Accepts any of at least two distinct types, in declaration order.
    Any(Vec<ValueType>),
}

impl ParamType {
    pub fn accepts(&self, ty: ValueType) -> bool {
        match self {
            ParamType::Fixed(fixed) => *fixed == ty,
            ParamType::Any(allowed) => allowed.contains(&ty),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Fixed(ty) => write!(f, "{ty}"),
            ParamType::Any(allowed) => {
                let names: Vec<&str> = allowed.iter().map(|ty| ty.name()).collect();
                f.write_str(&names.join("|"))
            }
        }
    }
}

/// Turns checked arguments into a runnable instance.
pub type Binder = Arc<dyn Fn(Args) -> Box<dyn ExecutableCommand> + Send + Sync>;

/// A host-supplied command descriptor: name, parameters and binder.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    params: Vec<ParamSpec>,
    binder: Binder,
}

impl CommandSpec {
    pub fn new<F, C>(name: impl Into<String>, params: Vec<ParamSpec>, bind: F) -> Self
    where
        F: Fn(Args) -> C + Send + Sync + 'static,
        C: ExecutableCommand + 'static,
    {
        Self {
            name: name.into(),
            params,
            binder: Arc::new(move |args| -> Box<dyn ExecutableCommand> {
                Box::new(bind(args))
            }),
        }
    }

    /// Descriptor for a [`BuiltinCommand`].
    pub fn of<T: BuiltinCommand>() -> Self {
        Self::new(T::name(), T::params(), T::bind)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A command descriptor that passed validation.
pub(crate) struct Schema {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamType>,
    pub(crate) binder: Binder,
}

/// A defect in a command vocabulary, found while building an environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("command name {name:?} is not an identifier")]
    InvalidName { name: String },
    #[error("command `{command}`: parameter positions {found:?} are not numbered 1 to {count}")]
    NonContiguous {
        command: String,
        found: Vec<usize>,
        count: usize,
    },
    #[error("command `{command}`: parameter {position} has type `{ty}`, expected int, float, string or any")]
    BadType {
        command: String,
        position: usize,
        ty: String,
    },
    #[error("command `{command}`: parameter {position} is `any` but lists no allowed types")]
    MissingAnyTypes { command: String, position: usize },
    #[error("command `{command}`: parameter {position} allows `{ty}`, expected int, float or string")]
    BadAnyType {
        command: String,
        position: usize,
        ty: String,
    },
    #[error("command `{command}`: parameter {position} allows `{ty}` more than once")]
    DuplicateAnyType {
        command: String,
        position: usize,
        ty: String,
    },
    #[error("command `{command}`: parameter {position} is `any` with {count} allowed type(s), it needs at least 2")]
    TooFewAnyTypes {
        command: String,
        position: usize,
        count: usize,
    },
    #[error("command `{name}` is registered more than once")]
    DuplicateName { name: String },
}

/// Check one descriptor and resolve its parameter types, stopping at the
/// first violation.
pub(crate) fn validate(spec: &CommandSpec) -> Result<Schema, SchemaError> {
    if !is_identifier(&spec.name) {
        return Err(SchemaError::InvalidName {
            name: spec.name.clone(),
        });
    }

    let mut ordered: Vec<&ParamSpec> = spec.params.iter().collect();
    ordered.sort_by_key(|p| p.position);
    let contiguous = ordered
        .iter()
        .enumerate()
        .all(|(i, p)| p.position == i + 1);
    if !contiguous {
        return Err(SchemaError::NonContiguous {
            command: spec.name.clone(),
            found: ordered.iter().map(|p| p.position).collect(),
            count: ordered.len(),
        });
    }

    let params = ordered
        .into_iter()
        .map(|p| resolve_param(&spec.name, p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Schema {
        name: spec.name.clone(),
        params,
        binder: Arc::clone(&spec.binder),
    })
}

fn resolve_param(command: &str, param: &ParamSpec) -> Result<ParamType, SchemaError> {
    if let Some(ty) = ValueType::from_name(&param.ty) {
        return Ok(ParamType::Fixed(ty));
    }
    if param.ty != ANY {
        return Err(SchemaError::BadType {
            command: command.to_string(),
            position: param.position,
            ty: param.ty.clone(),
        });
    }

    let Some(types) = &param.types else {
        return Err(SchemaError::MissingAnyTypes {
            command: command.to_string(),
            position: param.position,
        });
    };

    let mut allowed = Vec::new();
    let mut seen = HashSet::new();
    let entries: Vec<&str> = if types.trim().is_empty() {
        Vec::new()
    } else {
        types.split(',').map(str::trim).collect()
    };
    for entry in entries {
        let Some(ty) = ValueType::from_name(entry) else {
            return Err(SchemaError::BadAnyType {
                command: command.to_string(),
                position: param.position,
                ty: entry.to_string(),
            });
        };
        if !seen.insert(ty) {
            return Err(SchemaError::DuplicateAnyType {
                command: command.to_string(),
                position: param.position,
                ty: entry.to_string(),
            });
        }
        allowed.push(ty);
    }

    if allowed.len() < 2 {
        return Err(SchemaError::TooFewAnyTypes {
            command: command.to_string(),
            position: param.position,
            count: allowed.len(),
        });
    }
    Ok(ParamType::Any(allowed))
}

/// A name is usable only if the lexer reads it back as one identifier.
fn is_identifier(name: &str) -> bool {
    let mut lexer = Lexer::new(name);
    match (lexer.next(), lexer.next()) {
        (Some(Ok(spanned)), None) => {
            spanned.offset == 0 && matches!(spanned.token, Token::Ident(ref ident) if ident == name)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl ExecutableCommand for Nop {
        fn execute(self: Box<Self>) -> Output {
            Box::new(0i64)
        }
    }

    fn spec(name: &str, params: Vec<ParamSpec>) -> CommandSpec {
        CommandSpec::new(name, params, |_| Nop)
    }

    fn check(params: Vec<ParamSpec>) -> Result<Vec<ParamType>, SchemaError> {
        validate(&spec("cmd", params)).map(|schema| schema.params)
    }

    #[test]
    fn test_zero_params() {
        assert_eq!(check(vec![]).unwrap(), vec![]);
    }

    #[test]
    fn test_params_are_ordered_by_position() {
        let params = check(vec![
            ParamSpec::string(2),
            ParamSpec::int(1),
            ParamSpec::any(3, "float, string"),
        ])
        .unwrap();
        assert_eq!(
            params,
            vec![
                ParamType::Fixed(ValueType::Int),
                ParamType::Fixed(ValueType::String),
                ParamType::Any(vec![ValueType::Float, ValueType::String]),
            ]
        );
    }

    #[test]
    fn test_non_contiguous_positions() {
        let err = check(vec![ParamSpec::int(1), ParamSpec::int(3)]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::NonContiguous {
                command: "cmd".into(),
                found: vec![1, 3],
                count: 2,
            }
        );
        assert!(matches!(
            check(vec![ParamSpec::int(0)]),
            Err(SchemaError::NonContiguous { .. })
        ));
        assert!(matches!(
            check(vec![ParamSpec::int(1), ParamSpec::int(1)]),
            Err(SchemaError::NonContiguous { .. })
        ));
        assert!(matches!(
            check(vec![ParamSpec::int(2)]),
            Err(SchemaError::NonContiguous { .. })
        ));
    }

    #[test]
    fn test_bad_type() {
        let err = check(vec![ParamSpec::new(1, "uint")]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::BadType {
                command: "cmd".into(),
                position: 1,
                ty: "uint".into(),
            }
        );
        assert!(matches!(
            check(vec![ParamSpec::new(1, "Int")]),
            Err(SchemaError::BadType { .. })
        ));
    }

    #[test]
    fn test_any_without_types() {
        let err = check(vec![ParamSpec::new(1, "any")]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingAnyTypes { position: 1, .. }));
    }

    #[test]
    fn test_any_with_one_type() {
        let err = check(vec![ParamSpec::any(1, "int")]).unwrap_err();
        assert!(matches!(err, SchemaError::TooFewAnyTypes { count: 1, .. }));
        let err = check(vec![ParamSpec::any(1, "")]).unwrap_err();
        assert!(matches!(err, SchemaError::TooFewAnyTypes { count: 0, .. }));
    }

    #[test]
    fn test_any_with_unknown_type() {
        let err = check(vec![ParamSpec::any(1, "int,uint")]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::BadAnyType {
                command: "cmd".into(),
                position: 1,
                ty: "uint".into(),
            }
        );
        assert!(matches!(
            check(vec![ParamSpec::any(1, "int,any")]),
            Err(SchemaError::BadAnyType { .. })
        ));
        assert!(matches!(
            check(vec![ParamSpec::any(1, "int,,float")]),
            Err(SchemaError::BadAnyType { .. })
        ));
    }

    #[test]
    fn test_any_with_repeated_type() {
        let err = check(vec![ParamSpec::any(1, "int,int")]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateAnyType { ref ty, .. } if ty == "int"));
    }

    #[test]
    fn test_first_violation_wins() {
        let err = check(vec![ParamSpec::new(1, "uint"), ParamSpec::any(2, "int")]).unwrap_err();
        assert!(matches!(err, SchemaError::BadType { position: 1, .. }));
    }

    #[test]
    fn test_names_must_be_identifiers() {
        for name in ["", "two words", "1abc", "a(b", "-x"] {
            assert!(
                matches!(validate(&spec(name, vec![])), Err(SchemaError::InvalidName { .. })),
                "name {name:?}"
            );
        }
        assert!(validate(&spec("snake_case2", vec![])).is_ok());
    }

    #[test]
    fn test_param_type_display() {
        assert_eq!(ParamType::Fixed(ValueType::Float).to_string(), "float");
        assert_eq!(
            ParamType::Any(vec![ValueType::Int, ValueType::String]).to_string(),
            "int|string"
        );
    }

    #[test]
    fn test_args_accessors() {
        let args = Args::new(
            "cmd",
            vec![Value::Int(2), Value::Float(0.5), Value::from("s")],
        );
        assert_eq!(args.len(), 3);
        assert_eq!(args.int(1), 2);
        assert_eq!(args.float(2), 0.5);
        assert_eq!(args.string(3), "s");
        assert_eq!(args.number(1), 2.0);
        assert_eq!(args.number(2), 0.5);
    }

    #[test]
    #[should_panic(expected = "binder read parameter 1 as float")]
    fn test_args_misread_panics() {
        Args::new("cmd", vec![Value::Int(1)]).float(1);
    }

    #[test]
    #[should_panic(expected = "binder read position 2")]
    fn test_args_out_of_range_panics() {
        Args::new("cmd", vec![Value::Int(1)]).int(2);
    }
}
