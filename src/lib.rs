//! A small command language whose commands are supplied by the host.
//!
//! A host describes each command it offers (a name, typed positional
//! parameters and a binder that turns checked arguments into a runnable
//! instance) and assembles them into an [`Environment`]. Command strings such
//! as `add (mul 2 6) 5` are then parsed and evaluated against it, producing an
//! int, a float or a string.
//!
//! ```text
//! program = command ;
//! command = [ "(" ] , identifier , { param } , [ ")" ] ;
//! param   = string_lit | int_lit | float_lit | "(" command ")" ;
//! ```
//!
//! Mistakes in the command text come back as [`UserError`]. Mistakes in the
//! vocabulary itself (bad parameter declarations, duplicate names, a command
//! returning a type the language does not know) are programming errors and
//! panic.
//!
//! The public modules [`command`] and [`env`] expose the registration
//! interface; [`builtin`] holds the calculator vocabularies used by the
//! `gribble` binary.

pub mod builtin;
pub mod command;
pub mod env;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
mod value;

pub use command::{
    Args, BuiltinCommand, CommandSpec, ExecutableCommand, ParamSpec, ParamType, SchemaError,
};
pub use env::{Config, Environment, Signature};
pub use interpreter::{UserError, command_name, evaluate};
pub use lexer::SyntaxError;
pub use value::{Output, Value, ValueType};
