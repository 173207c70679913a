//! crossbuild CLI - compiler version resolution for cross-built projects

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use crossbuild::util::diagnostic::emit;
use crossbuild::ResolveError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ResolveError>() {
            Some(err) => emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("crossbuild=debug")
    } else {
        EnvFilter::new("crossbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = commands::GlobalArgs {
        verbose: cli.verbose,
        offline: cli.offline,
    };

    // Execute command
    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, &global),
        Commands::Matrix(args) => commands::matrix::execute(args, &global),
        Commands::Fingerprint(args) => commands::fingerprint::execute(args, &global),
        Commands::Classify(args) => commands::classify::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
