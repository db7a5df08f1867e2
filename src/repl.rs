use crate::env::Environment;
use crate::interpreter::UserError;
use crate::value::Value;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use std::io::Write;

/// Interactive loop: read a line, evaluate it, print the value or the error.
///
/// Ends on `Ctrl-C` or `Ctrl-D`.
pub fn repl(env: &Environment) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("gribble> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                let result = env.run(&line);
                report(env, &line, result, &mut std::io::stdout(), &mut std::io::stderr())?;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

/// Print the outcome of evaluating `line`.
///
/// Values go to `out`. Errors go to `err`, followed by the signature of the
/// command the line names, when there is one.
pub fn report(
    env: &Environment,
    line: &str,
    result: std::result::Result<Value, UserError>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<()> {
    match result {
        Ok(value) => writeln!(out, "{value}"),
        Err(error) => {
            writeln!(err, "{error}")?;
            if let Some(signature) = env.command_name(line).and_then(|name| env.signature(name)) {
                writeln!(err, "Usage: {signature}")?;
            }
            Ok(())
        }
    }
}
