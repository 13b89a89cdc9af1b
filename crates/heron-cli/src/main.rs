use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod session;
mod session_file;
mod settings;
mod tools;

use settings::Settings;

#[derive(Parser)]
#[command(name = "heron", version, about = "A tool-calling agent over chat-completion backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive session
    Session {
        /// Session name; an existing session of the same name is resumed
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Send a single message and print the reply
    Run {
        /// The message to send
        #[arg(short, long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::new()?;

    match cli.command {
        Command::Session { name } => session::start(settings, name).await,
        Command::Run { message } => session::run_once(settings, &message).await,
    }
}
