//! Tic-tac-toe Arena - multiplayer tic-tac-toe over HTTP.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_arena::{AppState, GameService, GameStore, SessionManager, UserStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            db_path,
        } => run_server(host, port, db_path).await,
    }
}

/// Run the HTTP game server
async fn run_server(host: String, port: u16, db_path: String) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Tic-tac-toe Arena");

    info!(path = %db_path, "Applying pending migrations");
    tictactoe_arena::run_migrations(&db_path)?;

    let games = GameStore::new(db_path.clone());
    let users = UserStore::new(db_path);
    let service = GameService::new(games, users);
    let state = AppState::new(service, SessionManager::new());

    tictactoe_arena::serve(&host, port, state).await?;
    Ok(())
}
