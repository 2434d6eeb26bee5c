//! Game orchestration: load, mutate through the engine, persist.

use derive_more::{Display, Error, From};
use rand::Rng;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::{DbError, GameStore, PlayerStanding, UserStore};
use crate::game::{Game, GameError};

/// Failures surfaced to the handler layer.
#[derive(Debug, Clone, Display, Error, From)]
pub enum ServiceError {
    /// The engine rejected the operation.
    #[display("{_0}")]
    Game(GameError),
    /// The storage layer failed.
    #[display("{_0}")]
    Db(DbError),
    /// The caller is bound to neither slot of the game.
    #[display("you are not a participant in this game")]
    NotAParticipant,
    /// Malformed input at the boundary.
    #[display("{reason}")]
    #[from(ignore)]
    InvalidInput {
        /// Human-readable rejection reason.
        reason: String,
    },
}

impl ServiceError {
    /// Creates a validation rejection with the given reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Service layer wrapping the game and user stores.
///
/// Every mutation follows the same shape: load the aggregate, apply an
/// engine operation to the owned instance, persist it back with a single
/// atomic update.
#[derive(Debug, Clone)]
pub struct GameService {
    games: GameStore,
    users: UserStore,
}

impl GameService {
    /// Creates a new service backed by the given stores.
    #[instrument(skip(games, users))]
    pub fn new(games: GameStore, users: UserStore) -> Self {
        info!("Creating GameService");
        Self { games, users }
    }

    /// Returns the underlying game store.
    pub fn games(&self) -> &GameStore {
        &self.games
    }

    /// Returns the underlying user store.
    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// Creates and persists a new game with no bound players.
    ///
    /// # Errors
    ///
    /// Rejects blank names with [`ServiceError::InvalidInput`]; storage
    /// failures propagate unchanged.
    #[instrument(skip(self))]
    pub fn create_game(&self, name: &str) -> Result<Game, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("game name must not be blank"));
        }

        let game = Game::new(name);
        self.games.insert_game(&game)?;
        info!(game_id = %game.id(), name = %game.name(), "Game created");
        Ok(game)
    }

    /// Seats `user_id` in the game and persists the result.
    ///
    /// # Errors
    ///
    /// Engine rejections ([`GameError::GameFull`], [`GameError::AlreadySeated`])
    /// and storage failures propagate to the caller.
    #[instrument(skip(self, rng))]
    pub fn join_game(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        rng: &mut impl Rng,
    ) -> Result<Game, ServiceError> {
        let mut game = self.games.get_by_id(game_id)?;
        let mark = game.join(user_id, rng)?;
        self.games.update_game(&game)?;
        info!(%game_id, %user_id, ?mark, "Player joined game");

        self.attach_names(std::slice::from_mut(&mut game))?;
        Ok(game)
    }

    /// Applies a move by `user_id` at `(row, col)` and persists the result.
    ///
    /// The engine only knows slot identities; resolving the caller to a
    /// slot, and rejecting non-participants, happens here.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotAParticipant`] if the user is bound to
    /// neither slot, [`ServiceError::InvalidInput`] for out-of-range
    /// coordinates; engine rejections and storage failures propagate.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        row: usize,
        col: usize,
    ) -> Result<Game, ServiceError> {
        if row >= 3 || col >= 3 {
            return Err(ServiceError::invalid("row and col must be in 0..3"));
        }

        let mut game = self.games.get_by_id(game_id)?;
        let mark = game.mark_of(user_id).ok_or(ServiceError::NotAParticipant)?;
        game.place(mark, row, col)?;
        self.games.update_game(&game)?;
        info!(%game_id, %user_id, ?mark, row, col, status = ?game.status(), "Move made");

        self.attach_names(std::slice::from_mut(&mut game))?;
        Ok(game)
    }

    /// Loads a single game with display names attached.
    ///
    /// # Errors
    ///
    /// Storage failures, including not-found, propagate unchanged.
    #[instrument(skip(self))]
    pub fn game_view(&self, game_id: Uuid) -> Result<Game, ServiceError> {
        let mut game = self.games.get_by_id(game_id)?;
        self.attach_names(std::slice::from_mut(&mut game))?;
        Ok(game)
    }

    /// Lists games still waiting for players, names attached.
    ///
    /// # Errors
    ///
    /// Storage failures propagate unchanged.
    #[instrument(skip(self))]
    pub fn open_games(&self) -> Result<Vec<Game>, ServiceError> {
        let mut games = self.games.open_games()?;
        self.attach_names(&mut games)?;
        Ok(games)
    }

    /// Lists every game the user participates in, names attached.
    ///
    /// # Errors
    ///
    /// Storage failures propagate unchanged.
    #[instrument(skip(self))]
    pub fn history(&self, user_id: Uuid) -> Result<Vec<Game>, ServiceError> {
        let mut games = self.games.games_by_player(user_id)?;
        self.attach_names(&mut games)?;
        Ok(games)
    }

    /// Returns the user's win/loss/draw summary.
    ///
    /// # Errors
    ///
    /// Storage failures propagate unchanged.
    #[instrument(skip(self))]
    pub fn standings(&self, user_id: Uuid) -> Result<PlayerStanding, ServiceError> {
        debug!(%user_id, "Computing standings");
        Ok(self.games.win_loss_draw(user_id)?)
    }

    fn attach_names(&self, games: &mut [Game]) -> Result<(), ServiceError> {
        self.games.fill_display_names(&self.users, games)?;
        Ok(())
    }
}
