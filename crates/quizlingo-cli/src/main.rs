//! quizlingo CLI: take and author personality quizzes from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizlingo", version, about = "Personality quizzes in the terminal")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example quiz draft
    Init,

    /// Validate quiz draft TOML files
    Validate {
        /// Path to a draft file or directory
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Publish a quiz draft to the configured backend
    Publish {
        /// Path to a draft file
        #[arg(long)]
        quiz: PathBuf,
    },

    /// List published quizzes
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Take a quiz
    Take {
        /// Quiz id (see `quizlingo list`)
        #[arg(long)]
        id: u64,

        /// Answers as 1-based display positions, e.g. "2,1,3". Reads stdin when omitted.
        #[arg(long)]
        answers: Option<String>,

        /// Seed for option order
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show your past results
    History {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Log in to an HTTP backend and print the access token
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Revoke the configured access token on an HTTP backend
    Logout,
}

#[tokio::main]
async fn main() {
    let filter = match "quizlingo=info".parse() {
        Ok(directive) => tracing_subscriber::EnvFilter::from_default_env().add_directive(directive),
        Err(_) => tracing_subscriber::EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::Publish { quiz } => commands::publish::execute(quiz, config).await,
        Commands::List { json } => commands::list::execute(json, config).await,
        Commands::Take { id, answers, seed } => {
            commands::take::execute(id, answers, seed, config).await
        }
        Commands::History { json } => commands::history::execute(json, config).await,
        Commands::Login { username, password } => {
            commands::login::execute(username, password, config).await
        }
        Commands::Logout => commands::logout::execute(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
