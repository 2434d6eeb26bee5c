//! The identity provider: durable storage for user accounts.

use std::collections::HashMap;

use diesel::prelude::*;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::{DbError, NewUser, User, UserProfile, schema};

/// Database store for user accounts.
///
/// This is the only component that sees password hashes; everything else
/// consumes [`UserProfile`] views.
#[derive(Debug, Clone)]
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Creates a new store backed by the database at the given path.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Self {
        info!(path = %db_path, "Creating UserStore");
        Self { db_path }
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Creates a new user account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the user name is already taken or a database
    /// error occurs.
    #[instrument(skip(self, new_user), fields(user_name = %new_user.user_name()))]
    pub fn create_user(&self, new_user: NewUser) -> Result<User, DbError> {
        debug!("Creating user");
        let mut conn = self.connection()?;

        let user = diesel::insert_into(schema::users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = %user.id(), user_name = %user.user_name(), "User created");
        Ok(user)
    }

    /// Gets a user by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        debug!(user_id = %id, "Looking up user by id");
        let mut conn = self.connection()?;

        let user = schema::users::table
            .find(id.to_string())
            .first::<User>(&mut conn)
            .optional()?;

        Ok(user)
    }

    /// Gets a user by login name. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_by_name(&self, user_name: &str) -> Result<Option<User>, DbError> {
        debug!(user_name = %user_name, "Looking up user by name");
        let mut conn = self.connection()?;

        let user = schema::users::table
            .filter(schema::users::user_name.eq(user_name))
            .first::<User>(&mut conn)
            .optional()?;

        if let Some(ref u) = user {
            debug!(user_id = %u.id(), "User found");
        } else {
            debug!("User not found");
        }

        Ok(user)
    }

    /// Updates a user's display name, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns a not-found [`DbError`] if the user does not exist, or a
    /// storage error on database failure.
    #[instrument(skip(self))]
    pub fn update_display_name(&self, id: Uuid, display_name: &str) -> Result<User, DbError> {
        debug!(user_id = %id, display_name = %display_name, "Updating display name");
        let mut conn = self.connection()?;

        let user = diesel::update(schema::users::table.find(id.to_string()))
            .set((
                schema::users::display_name.eq(display_name),
                schema::users::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = %id, "Display name updated");
        Ok(user)
    }

    /// Resolves a batch of user ids to profiles in one query.
    ///
    /// Unknown ids are simply absent from the returned map.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub fn resolve_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserProfile>, DbError> {
        debug!("Resolving users by id batch");
        let mut conn = self.connection()?;

        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let users = schema::users::table
            .filter(schema::users::id.eq_any(&id_strings))
            .load::<User>(&mut conn)?;

        let mut profiles = HashMap::with_capacity(users.len());
        for user in &users {
            let profile = user.profile()?;
            profiles.insert(*profile.id(), profile);
        }

        info!(requested = ids.len(), resolved = profiles.len(), "Users resolved");
        Ok(profiles)
    }
}
