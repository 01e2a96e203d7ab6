use rusqlite::{params, OptionalExtension, TransactionBehavior};

use crate::db::models::User;
use crate::db::{is_constraint_violation, StoreError, StoreResult};
use crate::state::DbPool;

/// Persists accounts and checks passwords against their bcrypt hashes.
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
    cost: u32,
}

impl UserStore {
    /// `cost` is the bcrypt work factor; production config uses `bcrypt::DEFAULT_COST`.
    pub fn with_cost(pool: DbPool, cost: u32) -> Self {
        Self { pool, cost }
    }

    /// Create an account. Username is checked before email, and both checks
    /// share one write transaction with the insert.
    pub fn register(&self, email: &str, username: &str, password: &str) -> StoreResult<i64> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || username.is_empty() || password.is_empty() {
            return Err(StoreError::InvalidInput(
                "Email, username and password are required".into(),
            ));
        }

        // Hash outside the transaction so the write lock is held briefly
        let password_hash = bcrypt::hash(password, self.cost)?;

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let username_taken: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?;
        if username_taken {
            return Err(StoreError::DuplicateUsername);
        }

        let email_taken: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )?;
        if email_taken {
            return Err(StoreError::DuplicateEmail);
        }

        tx.execute(
            "INSERT INTO users (email, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, datetime('now'))",
            params![email, username, password_hash],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                if e.to_string().contains("users.email") {
                    StoreError::DuplicateEmail
                } else {
                    StoreError::DuplicateUsername
                }
            } else {
                StoreError::Sql(e)
            }
        })?;
        let user_id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(user_id, username, "User registered");
        Ok(user_id)
    }

    /// Check an email/password pair. Unknown email and wrong password both
    /// yield `InvalidCredentials`.
    pub fn authenticate(&self, email: &str, password: &str) -> StoreResult<(i64, String)> {
        let conn = self.pool.get()?;
        let row: Option<(i64, String, String)> = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE email = ?1",
                params![email.trim()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((user_id, username, password_hash)) = row else {
            return Err(StoreError::InvalidCredentials);
        };

        // A malformed stored hash is treated like a mismatch
        if bcrypt::verify(password, &password_hash).unwrap_or(false) {
            Ok((user_id, username))
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    pub fn find_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, email, username, password_hash, created_at FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        username: row.get(2)?,
                        password_hash: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
