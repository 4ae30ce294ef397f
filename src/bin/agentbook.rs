//! Agentbook CLI Binary
//!
//! Command-line interface for parsing agent books and resolving agent references.

use agentbook::logging::init_logging;
use agentbook::tooling::cli::{Cli, CliContext};
use anyhow::Context;
use clap::Parser;
use std::process;

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let context = CliContext::new(
        cli.workspace.clone(),
        cli.config.clone(),
        cli.agents_dir.clone(),
    )
    .context("Error initializing workspace")?;

    let logging = cli.logging_config(&context.config().logging);
    init_logging(Some(&logging)).context("Error initializing logging")?;

    let output = context.execute(&cli.command)?;
    println!("{}", output.text);
    Ok(output.exit_code)
}

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
