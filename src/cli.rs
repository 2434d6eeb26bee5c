//! Command-line interface for tictactoe_arena.

use clap::{Parser, Subcommand};

/// Tic-tac-toe Arena - multiplayer tic-tac-toe over HTTP
#[derive(Parser, Debug)]
#[command(name = "tictactoe_arena")]
#[command(about = "Multiplayer tic-tac-toe server with persistent match history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long, default_value = "tictactoe_arena.db")]
        db_path: String,
    },
}
