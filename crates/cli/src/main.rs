//! Toko CLI - database migrations and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Apply the shop schema and the session table
//! toko-cli migrate
//!
//! # Insert the demo catalog if no products exist yet
//! toko-cli seed
//! ```
//!
//! Both commands read `TOKO_DATABASE_URL` (or `DATABASE_URL`), loading a
//! `.env` file first if one is present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "toko-cli")]
#[command(author, version, about = "Toko CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (shop schema and session store)
    Migrate,
    /// Seed the demo catalog when the product table is empty
    Seed,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed => commands::seed::run().await,
    }
}
