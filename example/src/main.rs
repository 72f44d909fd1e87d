use std::path::PathBuf;

use doclap::{Parser, ParserSettings, SetupOptions, Value, command};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[command]
/// Small chained calculator
///
/// Every subcommand prints its result, several of them may be chained.
///
/// Parameters
/// ----------
/// precision: int
///     Number of decimals to print
///
/// Notes
/// -----
/// Try ``calc add 1 2 mul 3 4 -s 0.5``.
fn calc(#[default(2)] precision: i64) -> i64 {
    precision
}

#[command]
/// Add numbers
///
/// Parameters
/// ----------
/// numbers: list of floats
///     Numbers to add
fn add(numbers: Vec<f64>) -> f64 {
    numbers.iter().sum()
}

#[command(name = "mul")]
/// Multiply numbers
///
/// Parameters
/// ----------
/// numbers: list of floats
///     Numbers to multiply
/// s: float
///     Scale applied to the product
/// negate: bool
///     Flip the sign of the product
fn multiply(numbers: Vec<f64>, #[default(1.0)] s: f64, #[default(false)] negate: bool) -> f64 {
    let product = numbers.iter().product::<f64>() * s;
    if negate { -product } else { product }
}

fn build(settings: ParserSettings) -> doclap::Result<Parser> {
    let mut parser = Parser::with_settings("calc", settings);
    parser.setup_args_with::<CalcCommand>(SetupOptions::default().setup_as("func"))?;
    parser.add_subparsers(true);
    parser.setup_subparser::<AddCommand>()?;
    parser.setup_subparser::<MultiplyCommand>()?;
    parser.create_arguments(true)?;
    Ok(parser)
}

fn settings() -> doclap::Result<ParserSettings> {
    match std::env::var_os("DOCLAP_SETTINGS") {
        Some(path) => ParserSettings::from_file(&PathBuf::from(path)),
        None => Ok(ParserSettings::default()),
    }
}

fn run() -> doclap::Result<()> {
    let parser = build(settings()?)?;
    let namespace = parser.parse_or_exit();
    debug!("parsed {namespace}");

    let precision = namespace.extract::<usize>("precision")?;
    match parser.dispatch_chained(&namespace)? {
        Value::Namespace(results) => {
            for (name, result) in results {
                info!("{name} done");
                match result {
                    Value::Float(x) => println!("{name}: {x:.precision$}"),
                    other => println!("{name}: {other}"),
                }
            }
        }
        _ => parser.command().print_help()?,
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
