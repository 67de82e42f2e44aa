//! CLI entry point for the chunk database server

use anyhow::Result;
use chunkdb::IndexKind;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chunkdb")]
#[command(about = "An in-memory vector database for text chunks", long_about = None)]
struct Cli {
    /// Index type libraries are created with
    #[arg(long, value_enum, default_value = "brute-force")]
    index: IndexKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { addr } => {
            chunkdb::server::start(&addr, cli.index).await?;
        }
    }

    Ok(())
}
