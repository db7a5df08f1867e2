use anyhow::{Context, Result, bail};
use argh::FromArgs;
use gribble::builtin::{float_calc, int_calc};
use gribble::{Config, Environment, repl};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Evaluate a command with a calculator, e.g. `gribble add 5 (mul 2 6)`.
struct Cli {
    #[argh(switch)]
    /// use the decimal calculator, whose operands may be int or float.
    float: bool,

    #[argh(option)]
    /// how deeply sub-commands may nest. Defaults to $GRIBBLE_MAX_DEPTH, then 256.
    max_depth: Option<usize>,

    #[argh(switch)]
    /// read commands interactively.
    repl: bool,

    #[argh(positional, greedy)]
    /// the command to evaluate; words are joined with spaces.
    command: Vec<String>,
}

fn config(cli: &Cli) -> Result<Config> {
    let mut config = Config::default();
    if let Some(depth) = cli.max_depth {
        config.max_depth = depth;
    } else if let Ok(depth) = std::env::var("GRIBBLE_MAX_DEPTH") {
        config.max_depth = depth
            .parse()
            .with_context(|| format!("GRIBBLE_MAX_DEPTH: can't parse {depth:?}"))?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli: Cli = argh::from_env();
    let vocabulary = if cli.float { float_calc() } else { int_calc() };
    let env = Environment::try_new(vocabulary)
        .context("calculator vocabulary is invalid")?
        .with_config(config(&cli)?);

    if cli.repl {
        return repl::repl(&env).context("interactive prompt failed");
    }

    if cli.command.is_empty() {
        eprintln!("Available commands:");
        for signature in env.signatures() {
            eprintln!("    {signature}");
        }
        bail!("no command given");
    }

    let line = cli.command.join(" ");
    let result = env.run(&line);
    let failed = result.is_err();
    repl::report(
        &env,
        &line,
        result,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )?;
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
