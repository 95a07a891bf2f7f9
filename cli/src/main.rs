mod record;
mod registry;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use command_shell_core::{CancellationToken, ShellBuilder};
use tracing_subscriber::EnvFilter;

use crate::registry::Registry;

#[derive(Debug, Parser)]
#[command(name = "command-shell")]
#[command(about = "Validate, document and run template command registries")]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a registry file.
    Check(RegistryArgs),
    /// Print the generated help text of a registry.
    Help(RegistryArgs),
    /// Read commands from stdin and print each bound record as a JSON line.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RegistryArgs {
    /// Path to the YAML registry.
    registry: PathBuf,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Path to the YAML registry.
    registry: PathBuf,
    /// Append internal failures (raw input and detail) to this file.
    #[arg(long)]
    log_errors: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Help(args) => run_help(args),
        Command::Run(args) => run_shell(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_registry(path: &Path) -> Result<Registry, String> {
    Registry::load(path)
        .map_err(|err| format!("Failed to load registry '{}': {err}", path.display()))
}

fn run_check(args: RegistryArgs) -> Result<(), String> {
    let registry = load_registry(&args.registry)?;
    registry
        .build(ShellBuilder::new().write_to(io::sink()))
        .map_err(|err| err.to_string())?;
    println!("ok: {} commands", registry.command_count());
    Ok(())
}

fn run_help(args: RegistryArgs) -> Result<(), String> {
    let registry = load_registry(&args.registry)?;
    let builder = registry
        .register_into(ShellBuilder::new().write_to(io::sink()))
        .map_err(|err| err.to_string())?;
    let text = builder.help_text();
    builder.build().map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

fn run_shell(args: RunArgs) -> Result<(), String> {
    let registry = load_registry(&args.registry)?;

    let mut builder = ShellBuilder::new();
    if let Some(path) = &args.log_errors {
        let sink = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| format!("Failed to open '{}': {err}", path.display()))?;
        builder = builder.log_errors_to(sink);
    }

    let mut shell = registry.build(builder).map_err(|err| err.to_string())?;
    shell
        .run(&CancellationToken::new())
        .map_err(|err| err.to_string())
}
