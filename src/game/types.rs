//! Core domain types for tic-tac-toe.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, FromRepr};

/// A single cell on the board.
///
/// The discriminants are the byte values used by the on-disk board encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, EnumIter,
)]
#[repr(u8)]
pub enum Cell {
    /// Unoccupied cell.
    Empty = 0,
    /// Cell claimed by player X.
    X = 1,
    /// Cell claimed by player O.
    O = 2,
}

impl Cell {
    /// Returns the mark occupying this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }
}

/// One of the two player slots in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Player X (moves first).
    X,
    /// Player O (moves second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Returns the cell value this mark places on the board.
    pub fn cell(self) -> Cell {
        match self {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }

    /// Returns the status in which this mark is to move.
    pub fn turn_status(self) -> GameStatus {
        match self {
            Mark::X => GameStatus::XTurn,
            Mark::O => GameStatus::OTurn,
        }
    }

    /// Returns the terminal status in which this mark has won.
    pub fn win_status(self) -> GameStatus {
        match self {
            Mark::X => GameStatus::XWon,
            Mark::O => GameStatus::OWon,
        }
    }
}

/// Current status of a game.
///
/// The discriminants are the ordinals stored in the `status` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, EnumIter,
)]
#[repr(i32)]
pub enum GameStatus {
    /// At least one player slot is still open.
    WaitingForPlayers = 0,
    /// Game ended with a full board and no winner.
    Draw = 1,
    /// Player X won.
    XWon = 2,
    /// Player O won.
    OWon = 3,
    /// Player X to move.
    XTurn = 4,
    /// Player O to move.
    OTurn = 5,
}

impl GameStatus {
    /// True once the game has ended; no further moves are accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Draw | GameStatus::XWon | GameStatus::OWon)
    }

    /// Returns the mark whose turn it is, if the game is in a turn state.
    pub fn turn(self) -> Option<Mark> {
        match self {
            GameStatus::XTurn => Some(Mark::X),
            GameStatus::OTurn => Some(Mark::O),
            _ => None,
        }
    }

    /// Returns the winning mark, if the game ended in a win.
    pub fn winner(self) -> Option<Mark> {
        match self {
            GameStatus::XWon => Some(Mark::X),
            GameStatus::OWon => Some(Mark::O),
            _ => None,
        }
    }
}

/// Error decoding a persisted board blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum BoardCodecError {
    /// The blob was not exactly 9 bytes.
    #[display("board blob must be 9 bytes, got {_0}")]
    Length(#[error(not(source))] usize),
    /// A byte was not a valid [`Cell`] ordinal.
    #[display("invalid cell byte: {_0}")]
    Cell(#[error(not(source))] u8),
}

/// 3x3 tic-tac-toe board.
///
/// Cells are addressed by zero-based `(row, col)` in `[0,3)`. Out-of-range
/// coordinates are a caller bug and panic rather than surfacing as a game
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Cells in row-major order.
    cells: [Cell; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    fn index(row: usize, col: usize) -> usize {
        assert!(row < 3 && col < 3, "cell ({row},{col}) out of bounds");
        row * 3 + col
    }

    /// Gets the cell at the given coordinates.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[Self::index(row, col)]
    }

    /// Sets the cell at the given coordinates.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[Self::index(row, col)] = cell;
    }

    /// True when all 9 cells are occupied.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != Cell::Empty)
    }

    /// Returns all cells in row-major order.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Encodes the board as 9 bytes in row-major order, one cell ordinal per
    /// byte. This is the persisted representation.
    pub fn to_bytes(&self) -> [u8; 9] {
        let mut bytes = [0u8; 9];
        for (byte, cell) in bytes.iter_mut().zip(self.cells.iter()) {
            *byte = *cell as u8;
        }
        bytes
    }

    /// Decodes a board from its 9-byte persisted representation.
    ///
    /// # Errors
    ///
    /// Returns [`BoardCodecError`] if the slice is not 9 bytes long or any
    /// byte is not a valid cell ordinal.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BoardCodecError> {
        if bytes.len() != 9 {
            return Err(BoardCodecError::Length(bytes.len()));
        }
        let mut cells = [Cell::Empty; 9];
        for (cell, &byte) in cells.iter_mut().zip(bytes.iter()) {
            *cell = Cell::from_repr(byte).ok_or(BoardCodecError::Cell(byte))?;
        }
        Ok(Self { cells })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn empty_board_round_trips() {
        let board = Board::new();
        let decoded = Board::from_bytes(&board.to_bytes()).expect("Decode failed");
        assert_eq!(board, decoded);
    }

    #[test]
    fn codec_is_identity_for_every_configuration() {
        // All 3^9 structurally valid boards, rule-violating ones included.
        let cells: Vec<Cell> = Cell::iter().collect();
        for mut n in 0..3usize.pow(9) {
            let mut board = Board::new();
            for pos in 0..9 {
                board.set(pos / 3, pos % 3, cells[n % 3]);
                n /= 3;
            }
            let bytes = board.to_bytes();
            let decoded = Board::from_bytes(&bytes).expect("Decode failed");
            assert_eq!(board, decoded);
            assert_eq!(bytes, decoded.to_bytes());
        }
    }

    #[test]
    fn bytes_are_row_major_ordinals() {
        let mut board = Board::new();
        board.set(0, 1, Cell::X);
        board.set(2, 2, Cell::O);
        assert_eq!(board.to_bytes(), [0, 1, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(matches!(
            Board::from_bytes(&[0; 8]),
            Err(BoardCodecError::Length(8))
        ));
        assert!(matches!(
            Board::from_bytes(&[0; 10]),
            Err(BoardCodecError::Length(10))
        ));
    }

    #[test]
    fn decode_rejects_invalid_cell_byte() {
        let mut bytes = [0u8; 9];
        bytes[4] = 3;
        assert!(matches!(
            Board::from_bytes(&bytes),
            Err(BoardCodecError::Cell(3))
        ));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn out_of_range_coordinates_panic() {
        Board::new().get(3, 0);
    }

    #[test]
    fn status_ordinals_are_stable() {
        assert_eq!(GameStatus::WaitingForPlayers as i32, 0);
        assert_eq!(GameStatus::Draw as i32, 1);
        assert_eq!(GameStatus::XWon as i32, 2);
        assert_eq!(GameStatus::OWon as i32, 3);
        assert_eq!(GameStatus::XTurn as i32, 4);
        assert_eq!(GameStatus::OTurn as i32, 5);
    }

    #[test]
    fn status_round_trips_through_ordinal() {
        for status in GameStatus::iter() {
            assert_eq!(GameStatus::from_repr(status as i32), Some(status));
        }
        assert_eq!(GameStatus::from_repr(6), None);
    }
}
