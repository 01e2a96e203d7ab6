use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::db::{StoreError, StoreResult};
use crate::state::DbPool;

/// Matches SQLite's `datetime()` output so stored values compare as text.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A freshly issued session, ready to be written into a cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes session tokens stored in the `sessions` table.
///
/// Expired rows are never purged; validation simply ignores them.
#[derive(Clone)]
pub struct SessionStore {
    pool: DbPool,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(pool: DbPool, hours: u64) -> Self {
        Self {
            pool,
            lifetime: Duration::hours(hours as i64),
        }
    }

    /// Create a new session for a user.
    pub fn create(&self, user_id: i64) -> StoreResult<IssuedSession> {
        self.create_at(user_id, Utc::now())
    }

    pub fn create_at(&self, user_id: i64, now: DateTime<Utc>) -> StoreResult<IssuedSession> {
        let conn = self.pool.get()?;

        let token = generate_token();
        // Whole seconds, so the cookie expiry matches what is stored
        let expires_at = truncate_to_seconds(now + self.lifetime);

        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, format_timestamp(expires_at)],
        )?;

        tracing::debug!(user_id, "Session created");
        Ok(IssuedSession { token, expires_at })
    }

    /// Resolve a token to its user id. Fails for unknown and expired tokens alike.
    pub fn validate(&self, token: &str) -> StoreResult<i64> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> StoreResult<i64> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > ?2",
            params![token, format_timestamp(now)],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StoreError::SessionNotFound)
    }

    /// Delete a session by token. Deleting an unknown token is not an error.
    pub fn revoke(&self, token: &str) -> StoreResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        tracing::debug!(rows, "Session revoked");
        Ok(())
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
