//! Durable storage for game aggregates and derived read queries.

use diesel::prelude::*;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::users::UserStore;
use crate::db::{DbError, GameRecord, PlayerStanding, schema};
use crate::game::{Game, GameStatus, Mark};

/// Database store for game aggregates.
///
/// Opens a fresh SQLite connection per call; each write is a single
/// statement, so concurrent readers never observe a half-written row.
#[derive(Debug, Clone)]
pub struct GameStore {
    db_path: String,
}

impl GameStore {
    /// Creates a new store backed by the database at the given path.
    ///
    /// Each call opens its own connection, so the path must name a durable
    /// file; tests point it at a temp file with the schema applied.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Self {
        info!(path = %db_path, "Creating GameStore");
        Self { db_path }
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Persists a newly created game, keyed by its id.
    ///
    /// Ids are generated fresh at creation, so a key collision is a caller
    /// bug and surfaces as a storage error.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, game), fields(game_id = %game.id()))]
    pub fn insert_game(&self, game: &Game) -> Result<(), DbError> {
        debug!("Inserting game");
        let mut conn = self.connection()?;

        diesel::insert_into(schema::games::table)
            .values(GameRecord::from_game(game))
            .execute(&mut conn)?;

        info!(name = %game.name(), "Game inserted");
        Ok(())
    }

    /// Overwrites the stored row for `game.id()` with the full current
    /// state, in one atomic UPDATE.
    ///
    /// # Errors
    ///
    /// Returns a not-found [`DbError`] if no row has that id, or a storage
    /// error on database failure.
    #[instrument(skip(self, game), fields(game_id = %game.id()))]
    pub fn update_game(&self, game: &Game) -> Result<(), DbError> {
        debug!("Updating game");
        let mut conn = self.connection()?;

        let record = GameRecord::from_game(game);
        let updated = diesel::update(schema::games::table.find(record.id()))
            .set(&record)
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DbError::not_found(format!(
                "Game {} not found for update",
                game.id()
            )));
        }

        info!(status = ?game.status(), "Game updated");
        Ok(())
    }

    /// Loads the game with the given id.
    ///
    /// # Errors
    ///
    /// Returns a not-found [`DbError`] on a miss, or a storage error on
    /// database failure.
    #[instrument(skip(self))]
    pub fn get_by_id(&self, id: Uuid) -> Result<Game, DbError> {
        debug!(game_id = %id, "Loading game");
        let mut conn = self.connection()?;

        let record = schema::games::table
            .find(id.to_string())
            .first::<GameRecord>(&mut conn)
            .optional()?
            .ok_or_else(|| DbError::not_found(format!("Game {} not found", id)))?;

        record.into_game()
    }

    /// Loads every game in which `player_id` occupies either slot, in
    /// unspecified order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn games_by_player(&self, player_id: Uuid) -> Result<Vec<Game>, DbError> {
        debug!(%player_id, "Loading games by player");
        let mut conn = self.connection()?;

        let id = player_id.to_string();
        let records = schema::games::table
            .filter(
                schema::games::player_x_id
                    .eq(&id)
                    .or(schema::games::player_o_id.eq(&id)),
            )
            .load::<GameRecord>(&mut conn)?;

        info!(%player_id, count = records.len(), "Player games loaded");
        records.into_iter().map(GameRecord::into_game).collect()
    }

    /// Loads every game still waiting for players.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn open_games(&self) -> Result<Vec<Game>, DbError> {
        debug!("Loading open games");
        let mut conn = self.connection()?;

        let records = schema::games::table
            .filter(schema::games::status.eq(GameStatus::WaitingForPlayers as i32))
            .load::<GameRecord>(&mut conn)?;

        info!(count = records.len(), "Open games loaded");
        records.into_iter().map(GameRecord::into_game).collect()
    }

    /// Loads every stored game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_games(&self) -> Result<Vec<Game>, DbError> {
        debug!("Loading all games");
        let mut conn = self.connection()?;

        let records = schema::games::table.load::<GameRecord>(&mut conn)?;

        info!(count = records.len(), "Games loaded");
        records.into_iter().map(GameRecord::into_game).collect()
    }

    /// Computes the win/loss/draw summary for a player.
    ///
    /// A win is a terminal game whose winning slot is bound to `player_id`;
    /// a loss is the opponent's win; a draw is a terminal [`GameStatus::Draw`].
    /// Games still waiting or in progress contribute to none of the counts.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn win_loss_draw(&self, player_id: Uuid) -> Result<PlayerStanding, DbError> {
        debug!(%player_id, "Computing standings");
        let games = self.games_by_player(player_id)?;

        let mut wins = 0;
        let mut losses = 0;
        let mut draws = 0;

        for game in &games {
            let Some(mark) = game.mark_of(player_id) else {
                continue;
            };
            match (game.status(), game.status().winner()) {
                (GameStatus::Draw, _) => draws += 1,
                (_, Some(winner)) if winner == mark => wins += 1,
                (_, Some(_)) => losses += 1,
                _ => {}
            }
        }

        let standing = PlayerStanding::new(wins, losses, draws);
        info!(
            %player_id,
            wins,
            losses,
            draws,
            win_rate = %format!("{:.1}%", standing.win_rate()),
            "Standings computed"
        );
        Ok(standing)
    }

    /// Attaches resolved display names to every bound slot across a batch
    /// of games, using a single identity lookup for all distinct player ids.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the identity lookup fails.
    #[instrument(skip(self, users, games), fields(games = games.len()))]
    pub fn fill_display_names(
        &self,
        users: &UserStore,
        games: &mut [Game],
    ) -> Result<(), DbError> {
        let mut ids: Vec<Uuid> = games
            .iter()
            .flat_map(|g| [*g.player_x_id(), *g.player_o_id()])
            .flatten()
            .collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(());
        }

        debug!(distinct_players = ids.len(), "Resolving display names");
        let profiles = users.resolve_by_ids(&ids)?;

        for game in games.iter_mut() {
            for mark in [Mark::X, Mark::O] {
                if let Some(id) = game.player_id(mark) {
                    if let Some(profile) = profiles.get(&id) {
                        game.set_player_name(mark, profile.display_name().clone());
                    }
                }
            }
        }
        Ok(())
    }
}
