//! Tic-tac-toe engine: board primitives and the game aggregate.

mod rules;
mod types;

pub use rules::{Game, GameError};
pub use types::{Board, BoardCodecError, Cell, GameStatus, Mark};
