//! Calculator vocabularies shipped with the crate.
//!
//! [`int_calc`] declares its commands as structs implementing
//! [`BuiltinCommand`]; [`float_calc`] builds descriptors directly with
//! [`CommandSpec::new`]. Both register `add`, `sub`, `mul` and `div`.

use crate::command::{Args, BuiltinCommand, CommandSpec, ExecutableCommand, ParamSpec};
use crate::value::Output;

/// Integer arithmetic: every operand and result is an `int`.
///
/// Overflow wraps. Division by zero yields 0.
pub fn int_calc() -> Vec<CommandSpec> {
    vec![
        CommandSpec::of::<Add>(),
        CommandSpec::of::<Sub>(),
        CommandSpec::of::<Mul>(),
        CommandSpec::of::<Div>(),
    ]
}

/// Decimal arithmetic: operands may be `int` or `float`, results are `float`.
pub fn float_calc() -> Vec<CommandSpec> {
    vec![
        float_op("add", |a, b| a + b),
        float_op("sub", |a, b| a - b),
        float_op("mul", |a, b| a * b),
        float_op("div", |a, b| a / b),
    ]
}

fn int_operands() -> Vec<ParamSpec> {
    vec![ParamSpec::int(1), ParamSpec::int(2)]
}

/// Add two integers.
pub struct Add {
    op1: i64,
    op2: i64,
}

impl BuiltinCommand for Add {
    fn name() -> &'static str {
        "add"
    }

    fn params() -> Vec<ParamSpec> {
        int_operands()
    }

    fn bind(args: Args) -> Self {
        Self {
            op1: args.int(1),
            op2: args.int(2),
        }
    }

    fn run(self) -> Output {
        Box::new(self.op1.wrapping_add(self.op2))
    }
}

/// Subtract the second integer from the first.
pub struct Sub {
    op1: i64,
    op2: i64,
}

impl BuiltinCommand for Sub {
    fn name() -> &'static str {
        "sub"
    }

    fn params() -> Vec<ParamSpec> {
        int_operands()
    }

    fn bind(args: Args) -> Self {
        Self {
            op1: args.int(1),
            op2: args.int(2),
        }
    }

    fn run(self) -> Output {
        Box::new(self.op1.wrapping_sub(self.op2))
    }
}

/// Multiply two integers.
pub struct Mul {
    op1: i64,
    op2: i64,
}

impl BuiltinCommand for Mul {
    fn name() -> &'static str {
        "mul"
    }

    fn params() -> Vec<ParamSpec> {
        int_operands()
    }

    fn bind(args: Args) -> Self {
        Self {
            op1: args.int(1),
            op2: args.int(2),
        }
    }

    fn run(self) -> Output {
        Box::new(self.op1.wrapping_mul(self.op2))
    }
}

/// Truncating integer division.
pub struct Div {
    op1: i64,
    op2: i64,
}

impl BuiltinCommand for Div {
    fn name() -> &'static str {
        "div"
    }

    fn params() -> Vec<ParamSpec> {
        int_operands()
    }

    fn bind(args: Args) -> Self {
        Self {
            op1: args.int(1),
            op2: args.int(2),
        }
    }

    fn run(self) -> Output {
        if self.op2 == 0 {
            tracing::warn!(dividend = self.op1, "integer division by zero, yielding 0");
            return Box::new(0i64);
        }
        Box::new(self.op1.wrapping_div(self.op2))
    }
}

/// A bound binary operation on two numbers.
struct FloatOp {
    op1: f64,
    op2: f64,
    apply: fn(f64, f64) -> f64,
}

impl ExecutableCommand for FloatOp {
    fn execute(self: Box<Self>) -> Output {
        Box::new((self.apply)(self.op1, self.op2))
    }
}

fn float_op(name: &str, apply: fn(f64, f64) -> f64) -> CommandSpec {
    CommandSpec::new(
        name,
        vec![ParamSpec::any(1, "int,float"), ParamSpec::any(2, "int,float")],
        move |args| FloatOp {
            op1: args.number(1),
            op2: args.number(2),
            apply,
        },
    )
}
