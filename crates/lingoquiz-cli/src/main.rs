//! lingoquiz CLI: validate quiz content and replay scripted sessions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lingoquiz", version, about = "Quiz engine developer harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate quiz content TOML files
    Validate {
        /// Path to a quiz file or directory
        #[arg(long)]
        content: PathBuf,
    },

    /// Drive a session from a scripted list of actions
    Replay {
        /// Quiz content file
        #[arg(long)]
        content: PathBuf,

        /// Action script (TOML)
        #[arg(long)]
        script: PathBuf,

        /// Directory to write the attempt JSON into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and an example quiz
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingoquiz=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { content } => commands::validate::execute(content),
        Commands::Replay {
            content,
            script,
            output,
            config,
        } => commands::replay::execute(content, script, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
