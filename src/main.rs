use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod context;

use commands::{CatalogCommand, ConfigCommand, ItemCommand, ListCommand, SaveCommand};
use config::Config;
use context::ListContext;

#[derive(Parser)]
#[command(name = "smartlist")]
#[command(version)]
#[command(about = "Grocery lists with a local cache and explicit save", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// JSON file of list rows as the server renders them
    #[arg(long, short, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and create lists
    List(ListCommand),

    /// Add, change and remove items
    Item(ItemCommand),

    /// Search the item catalog and pick from it
    Catalog(CatalogCommand),

    /// Save a list to the server
    Save(SaveCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartlist=warn,smart_list_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let mut ctx = ListContext::open(&config, cli.snapshot.as_deref())?;
    match command {
        Commands::List(cmd) => cmd.run(&mut ctx).await,
        Commands::Item(cmd) => cmd.run(&mut ctx).await,
        Commands::Catalog(cmd) => cmd.run(&mut ctx).await,
        Commands::Save(cmd) => cmd.run(&mut ctx).await,
        Commands::Config(cmd) => cmd.run(&config),
    }
}
