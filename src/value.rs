use std::any::Any;
use std::fmt;

/// What a command implementation hands back to the evaluator.
///
/// Commands return a boxed value of whatever concrete type they produce. The
/// evaluator accepts [`Value`], `i64`, `f64`, `String` and `&'static str`; any
/// other concrete type is a defect in the command and aborts evaluation.
pub type Output = Box<dyn Any>;

/// A value that may cross the boundary of the language: an argument or a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
}

/// The concrete type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Int,
    Float,
    String,
}

impl ValueType {
    /// Every type a value can have.
    pub const ALL: [ValueType; 3] = [ValueType::Int, ValueType::Float, ValueType::String];

    /// Name of the type as written in parameter declarations.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
        }
    }

    /// Resolve a declared type name. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// The type this value belongs to.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
        }
    }

    /// The integer, if this is an `int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is a `float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The text, if this is a `string`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Recover a value from a command's output, or give the output back if
    /// its concrete type is not one the language knows about.
    pub fn from_output(output: Output) -> Result<Value, Output> {
        let output = match output.downcast::<Value>() {
            Ok(v) => return Ok(*v),
            Err(o) => o,
        };
        let output = match output.downcast::<i64>() {
            Ok(v) => return Ok(Value::Int(*v)),
            Err(o) => o,
        };
        let output = match output.downcast::<f64>() {
            Ok(v) => return Ok(Value::Float(*v)),
            Err(o) => o,
        };
        let output = match output.downcast::<String>() {
            Ok(v) => return Ok(Value::String(*v)),
            Err(o) => o,
        };
        match output.downcast::<&'static str>() {
            Ok(v) => Ok(Value::String(v.to_string())),
            Err(o) => Err(o),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
