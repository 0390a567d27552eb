//
//  schematics-cli
//  main.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schematics_cli::cli::{Cli, Commands};
use schematics_cli::exit_codes;

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_codes::for_error(&e));
        }
    }
}

/// Logs go to stderr; `SCH_DEBUG` takes an `EnvFilter` directive.
fn init_logging() {
    let filter = EnvFilter::try_from_env("SCH_DEBUG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Auth(cmd) => cmd.run(&cli.global).await,
        Commands::Workspace(cmd) => cmd.run(&cli.global).await,
        Commands::Job(cmd) => cmd.run(&cli.global).await,
        Commands::Action(cmd) => cmd.run(&cli.global).await,
        Commands::Agent(cmd) => cmd.run(&cli.global).await,
        Commands::Inventory(cmd) => cmd.run(&cli.global).await,
        Commands::Policy(cmd) => cmd.run(&cli.global).await,
        Commands::Blueprint(cmd) => cmd.run(&cli.global).await,
        Commands::Config(cmd) => cmd.run(&cli.global).await,
        Commands::Api(cmd) => cmd.run(&cli.global).await,
        Commands::Completion(cmd) => cmd.run(&cli.global).await,
        Commands::Version => {
            println!("{} version {}", schematics_cli::APP_NAME, schematics_cli::VERSION);
            Ok(())
        }
    }
}
