//! Recipe Box CLI - Database migrations and user provisioning.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! rb-cli migrate
//!
//! # Create a user
//! rb-cli user create -e user@example.com -p secret -n "Jane Cook"
//!
//! # Create a superuser
//! rb-cli user create -e admin@example.com -p secret -n "Site Admin" --superuser
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rb-cli")]
#[command(author, version, about = "Recipe Box CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address (the domain is lowercased)
        #[arg(short, long)]
        email: String,

        /// Password; without one the account cannot log in
        #[arg(short, long)]
        password: Option<String>,

        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Grant staff and superuser flags
        #[arg(long)]
        superuser: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                password,
                name,
                superuser,
            } => {
                commands::user::create(commands::user::CreateUser {
                    email: &email,
                    password: password.as_deref(),
                    name: &name,
                    superuser,
                })
                .await?;
            }
        },
    }
    Ok(())
}
