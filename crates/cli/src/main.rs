//! MRTC CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mrtc migrate
//!
//! # Seed content rows from a YAML file (or a default `home` row)
//! mrtc seed content.yaml
//!
//! # Hash an admin password for ADMIN_PASSWORD_HASH / SUPER_ADMIN_PASSWORD_HASH
//! mrtc hash-password
//!
//! # Generate a session token for ADMIN_SESSION_TOKEN / SUPER_ADMIN_SESSION_TOKEN
//! mrtc gen-secret
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mrtc")]
#[command(author, version, about = "MRTC site CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed content rows
    Seed {
        /// YAML file with a list of content rows
        file: Option<PathBuf>,

        /// Replace rows that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Hash a password with Argon2id (reads it from stdin)
    HashPassword,
    /// Generate a random session token
    GenSecret {
        /// Number of random bytes (hex encoded, so the token is twice as long)
        #[arg(short, long, default_value_t = 32)]
        bytes: usize,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

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
        Commands::Seed { file, overwrite } => {
            commands::seed::content(file.as_deref(), overwrite).await?;
        }
        Commands::HashPassword => commands::secrets::hash_password()?,
        Commands::GenSecret { bytes } => commands::secrets::gen_secret(bytes)?,
    }
    Ok(())
}
