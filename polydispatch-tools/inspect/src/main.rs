//! Polydispatch Inspector
//!
//! Run with: `polydispatch-inspect <COMMAND>`

mod file;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use polydispatch::{Classifier, CompileError, Engine, Resolver, SignatureParseError, Value};

use crate::file::DescriptionFile;

#[derive(Parser)]
#[command(name = "polydispatch-inspect")]
#[command(about = "Inspect compiled dispatch tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a description file and print its dispatch table
    Table {
        /// Description file (TOML)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Show which entry a call would run
    Resolve {
        /// Description file (TOML)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Arguments as a JSON array
        #[arg(value_name = "ARGS_JSON")]
        args: String,
    },
    /// Print the type description of a JSON value
    Describe {
        /// The value, as JSON
        #[arg(value_name = "JSON")]
        value: String,

        /// How many array levels to descend into
        #[arg(long, default_value = "0")]
        depth: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Commands::Table { file } => print_table(file),
        Commands::Resolve { file, args } => resolve(file, args),
        Commands::Describe { value, depth } => {
            let value = parse_json(value)?;
            println!("{}", Classifier::standard().describe(&value, *depth));
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<Resolver> {
    let file = DescriptionFile::load(path)
        .with_context(|| format!("Failed to load description file: {}", path.display()))?;
    let description = file.description()?;
    debug!(entries = description.len(), path = %path.display(), "loaded description");

    let engine = Engine::builder().config(file.engine).build();
    match engine.compile(&description) {
        Ok(resolver) => Ok(resolver),
        Err(CompileError::Parse(err)) => {
            report_parse_error(&err);
            bail!("Failed to compile {}", path.display())
        }
        Err(err) => Err(err).with_context(|| format!("Failed to compile {}", path.display())),
    }
}

fn print_table(path: &Path) -> Result<()> {
    let resolver = load(path)?;
    let table = resolver.table();
    println!("{}", table.render());

    for collision in table.collisions() {
        println!(
            "collision: {} kept {} dropped {}",
            collision.key, collision.kept, collision.dropped
        );
    }
    info!(keys = table.len(), entries = table.entries().len(), "table compiled");
    Ok(())
}

fn resolve(path: &Path, args: &str) -> Result<()> {
    let resolver = load(path)?;
    let args = match parse_json(args)? {
        Value::Array(items) => items,
        other => bail!("ARGS_JSON must be a JSON array, got {other}"),
    };

    println!("type key: {}", resolver.type_key(&args));
    let selection = resolver.select(&args)?;
    println!("entry:    {}", selection.entry.source);
    println!("method:   {}", selection.entry.implementation.label());
    if !selection.padding.is_empty() {
        println!("padded:   {}", selection.key);
    }

    let result = resolver.call(args)?;
    println!("result:   {result}");
    Ok(())
}

fn parse_json(text: &str) -> Result<Value> {
    let json: serde_json::Value =
        serde_json::from_str(text).with_context(|| format!("Invalid JSON: {text}"))?;
    Ok(Value::from(json))
}

fn report_parse_error(err: &SignatureParseError) {
    let report = Report::build(ReportKind::Error, (), err.span.start)
        .with_message(format!("invalid signature `{}`", err.signature))
        .with_label(
            Label::new(err.span.clone())
                .with_message(err.kind.to_string())
                .with_color(Color::Red),
        )
        .finish();
    if report.eprint(Source::from(err.signature.as_str())).is_err() {
        eprintln!("{err}");
    }
}
