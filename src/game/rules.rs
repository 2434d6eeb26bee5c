//! The game aggregate and its state machine.

use derive_getters::Getters;
use derive_more::{Display, Error};
use rand::Rng;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::types::{Board, Cell, GameStatus, Mark};

/// Rejection reasons surfaced by the game engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// Both player slots are already bound.
    #[display("both player slots are already filled")]
    GameFull,
    /// The joining user already occupies a slot in this game.
    #[display("you are already seated in this game")]
    AlreadySeated,
    /// The game is not in the mover's turn state.
    #[display("it is not your turn")]
    NotYourTurn,
    /// The target cell is already occupied.
    #[display("cell is already occupied")]
    CellOccupied,
}

/// A tic-tac-toe game: board, player bindings, and status.
///
/// Operations mutate an exclusively held instance; callers persist the
/// mutated aggregate through the game store afterwards. The engine never
/// touches storage.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Game {
    /// Unique identifier, assigned at creation.
    id: Uuid,
    /// Display label, set at creation.
    name: String,
    /// User bound to the X slot, if any. Set at most once, never cleared.
    player_x_id: Option<Uuid>,
    /// User bound to the O slot, if any. Set at most once, never cleared.
    player_o_id: Option<Uuid>,
    /// The board.
    board: Board,
    /// Current status.
    status: GameStatus,
    /// Resolved display name for the X player. Never persisted.
    #[getter(skip)]
    player_x_name: Option<String>,
    /// Resolved display name for the O player. Never persisted.
    #[getter(skip)]
    player_o_name: Option<String>,
}

impl Game {
    /// Creates a new game with a fresh id, an empty board, and no players.
    #[instrument]
    pub fn new(name: impl Into<String> + std::fmt::Debug) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            player_x_id: None,
            player_o_id: None,
            board: Board::new(),
            status: GameStatus::WaitingForPlayers,
            player_x_name: None,
            player_o_name: None,
        }
    }

    /// Reconstructs a game from its stored fields.
    pub fn from_stored(
        id: Uuid,
        name: String,
        player_x_id: Option<Uuid>,
        player_o_id: Option<Uuid>,
        board: Board,
        status: GameStatus,
    ) -> Self {
        Self {
            id,
            name,
            player_x_id,
            player_o_id,
            board,
            status,
            player_x_name: None,
            player_o_name: None,
        }
    }

    /// Binds `user_id` to an open slot and returns the assigned mark.
    ///
    /// When both slots are open a coin flip decides the seat, so the first
    /// joiner is not systematically X. A single open slot is taken
    /// regardless of the flip. Once both slots are bound the status moves
    /// to [`GameStatus::XTurn`]; X always moves first, independent of join
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameFull`] if both slots are bound and
    /// [`GameError::AlreadySeated`] if the user already occupies a slot.
    /// Neither rejection mutates the game.
    #[instrument(skip(self, rng), fields(game_id = %self.id))]
    pub fn join(&mut self, user_id: Uuid, rng: &mut impl Rng) -> Result<Mark, GameError> {
        if self.player_x_id == Some(user_id) || self.player_o_id == Some(user_id) {
            warn!(%user_id, "User already seated");
            return Err(GameError::AlreadySeated);
        }
        let mark = match (self.player_x_id, self.player_o_id) {
            (Some(_), Some(_)) => {
                warn!(%user_id, "Game already has 2 players");
                return Err(GameError::GameFull);
            }
            (None, Some(_)) => Mark::X,
            (Some(_), None) => Mark::O,
            // Fresh flip on every call; heads seats the joiner as O.
            (None, None) => {
                if rng.gen_range(0..2) == 0 {
                    Mark::O
                } else {
                    Mark::X
                }
            }
        };
        match mark {
            Mark::X => self.player_x_id = Some(user_id),
            Mark::O => self.player_o_id = Some(user_id),
        }
        if self.player_x_id.is_some() && self.player_o_id.is_some() {
            self.status = GameStatus::XTurn;
        }
        debug!(%user_id, ?mark, status = ?self.status, "Player joined");
        Ok(mark)
    }

    /// Validates and applies a move for the given mark.
    ///
    /// On success the cell is marked and the status advances: a completed
    /// line wins, a full board draws, otherwise the turn flips.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotYourTurn`] if the game is not in that mark's
    /// turn state and [`GameError::CellOccupied`] if the target cell is
    /// taken. Neither rejection mutates the game.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn place(&mut self, mark: Mark, row: usize, col: usize) -> Result<(), GameError> {
        if self.status != mark.turn_status() {
            warn!(?mark, status = ?self.status, "Move out of turn");
            return Err(GameError::NotYourTurn);
        }
        if self.board.get(row, col) != Cell::Empty {
            warn!(?mark, row, col, "Cell already occupied");
            return Err(GameError::CellOccupied);
        }
        self.board.set(row, col, mark.cell());
        self.advance(mark);
        debug!(?mark, row, col, status = ?self.status, "Move applied");
        Ok(())
    }

    /// True iff it is `mark`'s turn and the target cell is empty.
    pub fn can_place(&self, mark: Mark, row: usize, col: usize) -> bool {
        self.status.turn() == Some(mark) && self.board.get(row, col) == Cell::Empty
    }

    /// Returns the mark `user_id` is bound to, if any.
    pub fn mark_of(&self, user_id: Uuid) -> Option<Mark> {
        if self.player_x_id == Some(user_id) {
            Some(Mark::X)
        } else if self.player_o_id == Some(user_id) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Returns the user bound to the given slot, if any.
    pub fn player_id(&self, mark: Mark) -> Option<Uuid> {
        match mark {
            Mark::X => self.player_x_id,
            Mark::O => self.player_o_id,
        }
    }

    /// Returns the resolved display name for the given slot, if attached.
    pub fn player_name(&self, mark: Mark) -> Option<&str> {
        match mark {
            Mark::X => self.player_x_name.as_deref(),
            Mark::O => self.player_o_name.as_deref(),
        }
    }

    /// Attaches a resolved display name to the given slot.
    pub fn set_player_name(&mut self, mark: Mark, name: String) {
        match mark {
            Mark::X => self.player_x_name = Some(name),
            Mark::O => self.player_o_name = Some(name),
        }
    }

    /// Re-evaluates the status after `mark` placed a cell.
    fn advance(&mut self, mark: Mark) {
        if let Some(winner) = self.winning_mark() {
            self.status = winner.win_status();
        } else if self.board.is_full() {
            self.status = GameStatus::Draw;
        } else {
            self.status = mark.opponent().turn_status();
        }
    }

    /// Scans rows, columns, then the two diagonals for a completed line.
    fn winning_mark(&self) -> Option<Mark> {
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8], // rows
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8], // columns
            [0, 4, 8],
            [2, 4, 6], // diagonals
        ];
        let cells = self.board.cells();
        for &[a, b, c] in &LINES {
            if cells[a] != Cell::Empty && cells[a] == cells[b] && cells[b] == cells[c] {
                return cells[a].mark();
            }
        }
        None
    }
}
