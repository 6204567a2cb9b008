//! Amazon Clone CLI - Database migrations and admin bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! ac-cli migrate storefront
//!
//! # Run admin database migrations
//! ac-cli migrate admin
//!
//! # Run all database migrations
//! ac-cli migrate all
//!
//! # Create the first superadmin (prompts for the password)
//! ac-cli admin create -e ops@example.com -n "Store Ops" -r superadmin
//!
//! # List admins
//! ac-cli admin list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ac-cli")]
#[command(author, version, about = "Amazon Clone CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run admin database migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`superadmin`, `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Read the password from this environment variable instead of prompting
        #[arg(long)]
        password_env: Option<String>,
    },
    /// List admin users
    List,
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password_env,
            } => {
                commands::admin::create_user(&email, &name, &role, password_env.as_deref())
                    .await?;
            }
            AdminAction::List => commands::admin::list_users().await?,
        },
    }
    Ok(())
}
