use anyhow::Result;
use clap::{Parser, Subcommand};

mod client;
mod commands;

#[derive(Parser)]
#[command(name = "tredd")]
#[command(about = "Fair exchange of files for payment")]
#[command(version)]
struct Cli {
    /// Seller daemon URL (also hosts the dev ledger)
    #[arg(long, global = true, env = "TREDD_SERVER", default_value = "http://localhost:20544")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Buy a file: request, verify, fund, and settle
    Buy(commands::buy::BuyArgs),
    /// Compute a file's clear root; optionally publish it to a content tree
    Hash(commands::hash::HashArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Buy(args) => commands::buy::run(&cli.server, args).await,
        Commands::Hash(args) => commands::hash::run(args),
    }
}
