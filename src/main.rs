mod cli;
mod compare;
mod config;
mod engine;
mod export;
mod oracle;
mod point;
mod provider;
mod source;
mod table;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitescout=info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Suggest { candidates, model } => {
            match command::suggest(*candidates, model).await {
                Ok(filename) => println!("File saved to `{}`", filename),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Commands::Enrich(args) => match command::enrich(args).await {
            Ok(filename) => println!("File saved to `{}`", filename),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Compare {
            benchmark,
            candidates,
        } => match command::compare(benchmark, candidates).await {
            Ok(filename) => println!("Profile saved to `{}`", filename),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Analyze {
            benchmark,
            candidates,
            model,
        } => match command::analyze(benchmark, candidates, model).await {
            Ok(filename) => println!("Matches saved to `{}`", filename),
            Err(e) => eprintln!("Error: {}", e),
        },
    }

    Ok(())
}
