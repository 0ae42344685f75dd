//! Flatdocs - flat-file document repository
//!
//! Lists, renders, edits, creates, and deletes text and markdown files in a
//! single directory, with sign-in required for every change.

mod app;
mod auth;
mod core;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::auth::credentials::{CredentialFile, PasswordDigest};
use crate::core::config::{AppConfig, Environment};
use crate::core::file_system::FsDocumentStore;
use crate::core::render::RendererRegistry;

#[derive(Debug, Parser)]
#[command(name = "flatdocs", version, about = "Flat-file text and markdown repository")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the document repository over HTTP (default)
    Serve(ServeArgs),
    /// Print an argon2 digest for an entry in the credential file
    HashPassword {
        /// Plaintext password to hash
        password: String,
    },
}

#[derive(Debug, Default, Args)]
struct ServeArgs {
    /// Listen address, e.g. 127.0.0.1:4567
    #[arg(long)]
    bind: Option<String>,
    /// Directory holding the documents
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// JSON file mapping usernames to password digests
    #[arg(long)]
    users: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
        Command::HashPassword { password } => {
            let digest = PasswordDigest::generate(&password)?;
            println!("{}", digest.as_str());
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let environment = Environment::from_env();
    let mut config = AppConfig::load()?;

    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(users) = args.users {
        config.credentials_file = Some(users);
    }

    tracing::info!("Starting Flatdocs ({:?})...", environment);

    let store = FsDocumentStore::open(config.storage_root(environment), RendererRegistry::default())
        .context("Failed to open document store")?;
    let credentials = CredentialFile::load(&config.credentials_path(environment))?;

    let state = AppState::new(store, credentials, &config.server.session_cookie);
    server::serve(&config.server.bind_addr, state).await
}
