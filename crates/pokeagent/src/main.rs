//! pokeagent: ask an LLM agent about Pokémon

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    ask_command, index_command, init_command, lookup_command, setup_command, status_command,
};

#[derive(Parser)]
#[command(name = "pokeagent")]
#[command(about = "Answer questions about Pokémon using live PokeAPI data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and data directory
    Init,
    /// Interactive setup wizard
    Setup,
    /// Ask the agent a question
    Ask {
        /// Question to ask; omit for an interactive session
        #[arg(short, long)]
        message: Option<String>,
        /// Conversation ID
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Do not persist the conversation
        #[arg(long)]
        no_save: bool,
    },
    /// Look up one Pokémon and print the tool output
    Lookup {
        /// Pokémon name
        name: String,
    },
    /// Download the name index from PokeAPI
    Index {
        /// Where to write the index (defaults to the configured path)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Listing endpoint
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Setup => setup_command().await,
        Commands::Ask {
            message,
            session,
            no_save,
        } => ask_command(message, session, no_save).await,
        Commands::Lookup { name } => lookup_command(name).await,
        Commands::Index { output, url } => index_command(output, url).await,
        Commands::Status => status_command().await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
