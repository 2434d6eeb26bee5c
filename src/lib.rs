//! Multiplayer tic-tac-toe service library.
//!
//! # Architecture
//!
//! - **Game engine** ([`Game`], [`Board`]): turn sequencing, win/draw
//!   detection, and player-slot assignment. Pure state machine; never
//!   touches storage.
//! - **Stores** ([`GameStore`], [`UserStore`]): diesel/SQLite persistence
//!   for game aggregates and user accounts.
//! - **Service** ([`GameService`]): load-mutate-persist orchestration and
//!   participant resolution.
//! - **Server** ([`router`], [`serve`]): axum JSON handlers with
//!   cookie-session authentication.
//!
//! # Example
//!
//! ```
//! use tictactoe_arena::{Game, GameStatus, Mark};
//!
//! let mut game = Game::new("lunch match");
//! let alice = uuid::Uuid::new_v4();
//! let bob = uuid::Uuid::new_v4();
//!
//! let mut rng = rand::thread_rng();
//! game.join(alice, &mut rng)?;
//! game.join(bob, &mut rng)?;
//! assert_eq!(*game.status(), GameStatus::XTurn);
//!
//! game.place(Mark::X, 1, 1)?;
//! assert_eq!(*game.status(), GameStatus::OTurn);
//! # Ok::<(), tictactoe_arena::GameError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod auth;
mod db;
mod game;
mod server;
mod service;

// Crate-level exports via pub use
pub use auth::{
    SessionManager, clear_session_cookie, hash_password, session_cookie, token_from_cookies,
    verify_password,
};
pub use db::{
    DbError, DbErrorKind, GameRecord, GameStore, NewUser, PlayerStanding, User, UserProfile,
    UserStore, run_migrations,
};
pub use game::{Board, BoardCodecError, Cell, Game, GameError, GameStatus, Mark};
pub use server::{ApiError, AppState, GameView, PlayerView, router, serve};
pub use service::{GameService, ServiceError};
