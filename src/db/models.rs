//! Database models and conversions to the domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{DbError, schema};
use crate::game::{Board, Game, GameStatus};

/// User account database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::users)]
pub struct User {
    id: String,
    user_name: String,
    display_name: String,
    password_hash: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl User {
    /// Parses the stored id into a [`Uuid`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored id is not a valid UUID.
    pub fn uuid(&self) -> Result<Uuid, DbError> {
        Uuid::parse_str(&self.id).map_err(|e| DbError::new(format!("Invalid user id: {}", e)))
    }

    /// Builds the resolved identity view exposed outside the store.
    ///
    /// The password hash never leaves the db layer.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored id is not a valid UUID.
    pub fn profile(&self) -> Result<UserProfile, DbError> {
        Ok(UserProfile::new(self.uuid()?, self.display_name.clone()))
    }
}

/// Insertable user model for account registration.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    id: String,
    user_name: String,
    display_name: String,
    password_hash: String,
}

impl NewUser {
    /// Creates an insertable user with a freshly generated id.
    pub fn with_fresh_id(
        user_name: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self::new(
            Uuid::new_v4().to_string(),
            user_name.into(),
            display_name.into(),
            password_hash.into(),
        )
    }
}

/// Resolved display data for a user, as returned by batch lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct UserProfile {
    id: Uuid,
    display_name: String,
}

/// Game database row: the persisted shape of a [`Game`].
///
/// One model serves insert and update because ids are generated by the
/// aggregate at creation, never by the database.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Insertable, AsChangeset, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(treat_none_as_null = true)]
pub struct GameRecord {
    id: String,
    player_x_id: Option<String>,
    player_o_id: Option<String>,
    status: i32,
    board: Vec<u8>,
    name: String,
}

impl GameRecord {
    /// Encodes a game aggregate into its row form.
    pub fn from_game(game: &Game) -> Self {
        Self {
            id: game.id().to_string(),
            player_x_id: game.player_x_id().as_ref().map(Uuid::to_string),
            player_o_id: game.player_o_id().as_ref().map(Uuid::to_string),
            status: *game.status() as i32,
            board: game.board().to_bytes().to_vec(),
            name: game.name().clone(),
        }
    }

    /// Decodes the row back into a game aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if an id column is not a valid UUID, the status
    /// ordinal is unknown, or the board blob does not decode.
    pub fn into_game(self) -> Result<Game, DbError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DbError::new(format!("Invalid game id '{}': {}", self.id, e)))?;
        let player_x_id = parse_player_id(self.player_x_id.as_deref())?;
        let player_o_id = parse_player_id(self.player_o_id.as_deref())?;
        let status = GameStatus::from_repr(self.status)
            .ok_or_else(|| DbError::new(format!("Invalid status ordinal: {}", self.status)))?;
        let board = Board::from_bytes(&self.board)
            .map_err(|e| DbError::new(format!("Invalid board blob: {}", e)))?;
        Ok(Game::from_stored(
            id,
            self.name,
            player_x_id,
            player_o_id,
            board,
            status,
        ))
    }
}

fn parse_player_id(id: Option<&str>) -> Result<Option<Uuid>, DbError> {
    id.map(|s| {
        Uuid::parse_str(s).map_err(|e| DbError::new(format!("Invalid player id '{}': {}", s, e)))
    })
    .transpose()
}

/// Win/loss/draw summary for a player, over their terminal games only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Getters, new)]
pub struct PlayerStanding {
    wins: i32,
    losses: i32,
    draws: i32,
}

impl PlayerStanding {
    /// Total number of terminal games counted.
    pub fn total(&self) -> i32 {
        self.wins + self.losses + self.draws
    }

    /// Calculates win rate as a percentage (0.0-100.0).
    pub fn win_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.wins as f64 / total as f64) * 100.0
        }
    }
}
