use gribble::builtin::{float_calc, int_calc};
use gribble::parser::parse;
use gribble::{
    Args, BuiltinCommand, CommandSpec, Config, Environment, Output, ParamSpec, SchemaError,
    UserError, Value,
};
use proptest::prelude::*;

/// Joins its two arguments with a separator.
struct Join {
    left: String,
    right: String,
}

impl BuiltinCommand for Join {
    fn name() -> &'static str {
        "join"
    }

    fn params() -> Vec<ParamSpec> {
        vec![ParamSpec::string(1), ParamSpec::any(2, "string,int,float")]
    }

    fn bind(args: Args) -> Self {
        Self {
            left: args.string(1),
            right: args.value(2).to_string(),
        }
    }

    fn run(self) -> Output {
        Box::new(format!("{}-{}", self.left, self.right))
    }
}

fn strings() -> Environment {
    let mut specs = int_calc();
    specs.push(CommandSpec::of::<Join>());
    Environment::new(specs)
}

#[test]
fn test_calculator_examples() {
    let env = Environment::new(int_calc());
    assert_eq!(env.run("add 35 7").unwrap(), Value::Int(42));
    assert_eq!(env.run("add (add 30 5) 7").unwrap(), Value::Int(42));
    assert_eq!(env.run("(sub (mul 7 7) (add 3 4))").unwrap(), Value::Int(42));

    let env = Environment::new(float_calc());
    assert_eq!(env.run("div (add 1 2) 4").unwrap(), Value::Float(0.75));
}

#[test]
fn test_strings_and_mixed_vocabulary() {
    let env = strings();
    assert_eq!(
        env.run(r#"join "a b" (join `c` (add 1 2))"#).unwrap(),
        Value::from("a b-c-3")
    );
    assert_eq!(env.run("join \"x\" 1.5").unwrap(), Value::from("x-1.5"));
}

#[derive(Debug, PartialEq)]
enum Fault {
    Syntax,
    Unknown,
    Arity,
    Type,
}

fn fault(err: &UserError) -> Fault {
    match err {
        UserError::Syntax(_) => Fault::Syntax,
        UserError::UnknownCommand(_) => Fault::Unknown,
        UserError::Arity { .. } => Fault::Arity,
        UserError::ArgType { .. } => Fault::Type,
    }
}

#[test]
fn test_every_malformed_command_is_an_error() {
    let env = strings();
    for (text, expected) in [
        ("add (2 3)", Fault::Syntax),
        ("add (2 3", Fault::Syntax),
        ("dne 1", Fault::Unknown),
        ("", Fault::Syntax),
        ("add 1 2 3", Fault::Arity),
        ("add 1.0 2.0", Fault::Type),
        ("add 1", Fault::Arity),
        (")", Fault::Syntax),
        ("(", Fault::Syntax),
        ("add 1 2)", Fault::Syntax),
        ("(add 1 2) 3", Fault::Syntax),
        ("add add 1 2", Fault::Syntax),
        ("join 1 2", Fault::Type),
        ("join \"a", Fault::Syntax),
        ("add 1.2.3 4", Fault::Syntax),
        ("add 1 # 2", Fault::Syntax),
    ] {
        let err = env.run(text).unwrap_err();
        assert_eq!(fault(&err), expected, "{text:?} failed with {err}");
    }
}

#[test]
fn test_non_contiguous_params_abort_construction() {
    struct Bad;
    impl BuiltinCommand for Bad {
        fn name() -> &'static str {
            "bad"
        }
        fn params() -> Vec<ParamSpec> {
            vec![ParamSpec::int(1), ParamSpec::int(3)]
        }
        fn bind(_args: Args) -> Self {
            Bad
        }
        fn run(self) -> Output {
            Box::new(0i64)
        }
    }

    let err = Environment::try_new(vec![CommandSpec::of::<Bad>()]).unwrap_err();
    assert!(matches!(err, SchemaError::NonContiguous { .. }));
    let panicked = std::panic::catch_unwind(|| Environment::new(vec![CommandSpec::of::<Bad>()]));
    assert!(panicked.is_err());
}

#[test]
fn test_malformed_any_sets_abort_construction() {
    for types in ["int", "int,uint", "int,int", ""] {
        let spec = CommandSpec::of::<Join>();
        let broken = CommandSpec::new(
            "broken",
            vec![ParamSpec::any(1, types)],
            |_| Join {
                left: String::new(),
                right: String::new(),
            },
        );
        assert!(
            Environment::try_new(vec![spec, broken]).is_err(),
            "types {types:?} should be refused"
        );
    }
}

#[test]
fn test_duplicate_names_across_vocabularies() {
    let mut specs = int_calc();
    specs.extend(float_calc());
    assert_eq!(
        Environment::try_new(specs).unwrap_err(),
        SchemaError::DuplicateName { name: "add".into() }
    );
}

#[test]
fn test_deep_nesting() {
    let env = Environment::new(int_calc()).with_config(Config { max_depth: 1000 });
    let mut text = "add 0 1".to_string();
    for _ in 0..200 {
        text = format!("add 1 ({text})");
    }
    assert_eq!(env.run(&text).unwrap(), Value::Int(201));

    let shallow = env.clone().with_config(Config { max_depth: 10 });
    assert!(matches!(shallow.run(&text), Err(UserError::Syntax(_))));
}

proptest! {
    #[test]
    fn prop_arbitrary_text_never_panics(text in "\\PC{0,40}") {
        let env = strings();
        let _ = env.run(&text);
        let _ = env.command_name(&text);
    }

    #[test]
    fn prop_token_soup_never_panics(
        words in prop::collection::vec(
            prop::sample::select(vec![
                "(", ")", "add", "join", "mul", "1", "-2", "3.5", "\"s\"", "`r`", "x", "",
            ]),
            0..12,
        )
    ) {
        let text = words.join(" ");
        let env = strings();
        let _ = env.run(&text);
    }

    #[test]
    fn prop_evaluation_is_deterministic(
        a in -1000i64..1000,
        b in -1000i64..1000,
        c in -1000i64..1000,
    ) {
        let env = Environment::new(int_calc());
        let text = format!("sub (mul {a} {b}) (add {b} {c})");
        let first = env.run(&text).unwrap();
        let second = env.run(&text).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, Value::Int(a * b - (b + c)));
    }

    #[test]
    fn prop_outer_parens_are_optional(a in any::<i64>(), b in any::<i64>()) {
        let bare = parse(&format!("add {a} {b}")).unwrap();
        let wrapped = parse(&format!("(add {a} {b})")).unwrap();
        prop_assert_eq!(bare, wrapped);
    }
}
