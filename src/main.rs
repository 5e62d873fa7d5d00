use std::{
    io::{self, Read},
    path::PathBuf,
    process,
};

use clap::{Parser as ClapParser, Subcommand};
use hdfq::{
    cli::{self, CliError, OutputFormat, RepairOptions, RunOptions},
    store::ErrorMode,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "hdfq")]
#[command(
    about = "Command-line processor for viewing and editing objects and attributes in hierarchical documents, with a jq-like syntax"
)]
#[command(version)]
#[command(arg_required_else_help = true)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Filter to evaluate
    #[arg(required = true)]
    filter: Option<String>,

    /// Document to run the filter on (read from stdin if not provided)
    path: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Fail on malformed entries instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Log every parsed and evaluated statement to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair a corrupted document by extracting its valid groups and datasets
    Repair {
        /// Document to repair (read from stdin if not provided)
        path: Option<PathBuf>,

        /// List the entries that could not be recovered
        #[arg(long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Some(Commands::Repair { path, verbose }) => run_repair(path, verbose),
        None => run_filter(
            cli.filter.unwrap_or_default(),
            cli.path,
            cli.json,
            cli.strict,
        ),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// `HDFQ_LOG` takes `EnvFilter` directives; `-v` overrides it with `debug`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("HDFQ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match path {
        Some(path) => Ok(path),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(PathBuf::from(buffer.trim()))
        }
        None => Err(CliError::NoPath),
    }
}

fn run_filter(
    filter: String,
    path: Option<PathBuf>,
    json: bool,
    strict: bool,
) -> Result<(), CliError> {
    let options = RunOptions {
        filter,
        path: resolve_path(path)?,
        format: if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
        error_mode: if strict {
            ErrorMode::Strict
        } else {
            ErrorMode::Ignore
        },
    };

    cli::execute(&options, io::stdout().lock())?;
    Ok(())
}

fn run_repair(path: Option<PathBuf>, verbose: bool) -> Result<(), CliError> {
    let options = RepairOptions {
        path: resolve_path(path)?,
        verbose,
    };

    cli::repair_document(&options, io::stdout().lock())?;
    Ok(())
}
