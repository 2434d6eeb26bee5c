//! Password hashing and cookie-session management.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Name of the session cookie.
const SESSION_COOKIE: &str = "sid";

/// Hashes a password with a fresh 16-byte random salt.
///
/// The stored form is `hex(salt)$hex(sha256(salt || password))`; it is
/// opaque to every layer above the user store.
pub fn hash_password(password: &str, rng: &mut impl Rng) -> String {
    let mut salt = [0u8; 16];
    rng.fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Verifies a password against its stored hash.
///
/// Malformed stored values verify as false rather than erroring; they can
/// only arise from manual database edits.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(digest) = hex::decode(digest_hex) else {
        return false;
    };
    salted_digest(&salt, password)[..] == digest[..]
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// In-memory table of live session tokens.
///
/// Sessions do not survive a restart; clients simply log in again.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, Uuid>>>,
}

impl SessionManager {
    /// Creates a new session manager.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session manager");
        Self::default()
    }

    /// Opens a session for the user and returns the new token.
    #[instrument(skip(self, rng))]
    pub fn login(&self, user_id: Uuid, rng: &mut impl Rng) -> String {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(token.clone(), user_id);

        info!(%user_id, "Session opened");
        token
    }

    /// Returns the user bound to the token, if the session is live.
    #[instrument(skip(self, token))]
    pub fn user_for(&self, token: &str) -> Option<Uuid> {
        let sessions = self.sessions.lock().unwrap();
        let user = sessions.get(token).copied();

        if user.is_none() {
            debug!("No session for token");
        }

        user
    }

    /// Closes the session for the token. Returns whether one was live.
    #[instrument(skip(self, token))]
    pub fn logout(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let closed = sessions.remove(token).is_some();
        debug!(closed, "Session closed");
        closed
    }
}

/// Formats the `Set-Cookie` value that installs a session token.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// Formats the `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extracts the session token from a `Cookie:` header value.
pub fn token_from_cookies(header: &str) -> Option<&str> {
    header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}
