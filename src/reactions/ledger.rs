use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::db::{is_constraint_violation, StoreError, StoreResult};
use crate::state::DbPool;

/// What a reaction is attached to. Each kind has its own ledger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    fn delete_sql(self) -> &'static str {
        match self {
            TargetKind::Post => "DELETE FROM post_reactions WHERE user_id = ?1 AND post_id = ?2",
            TargetKind::Comment => {
                "DELETE FROM comment_reactions WHERE user_id = ?1 AND comment_id = ?2"
            }
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            TargetKind::Post => {
                "INSERT INTO post_reactions (user_id, post_id, reaction_type) VALUES (?1, ?2, ?3)"
            }
            TargetKind::Comment => {
                "INSERT INTO comment_reactions (user_id, comment_id, reaction_type) VALUES (?1, ?2, ?3)"
            }
        }
    }

    fn select_sql(self) -> &'static str {
        match self {
            TargetKind::Post => {
                "SELECT reaction_type FROM post_reactions WHERE user_id = ?1 AND post_id = ?2"
            }
            TargetKind::Comment => {
                "SELECT reaction_type FROM comment_reactions WHERE user_id = ?1 AND comment_id = ?2"
            }
        }
    }

    fn counts_sql(self) -> &'static str {
        match self {
            TargetKind::Post => {
                "SELECT COALESCE(SUM(reaction_type = 'LIKE'), 0),
                        COALESCE(SUM(reaction_type = 'DISLIKE'), 0)
                 FROM post_reactions WHERE post_id = ?1"
            }
            TargetKind::Comment => {
                "SELECT COALESCE(SUM(reaction_type = 'LIKE'), 0),
                        COALESCE(SUM(reaction_type = 'DISLIKE'), 0)
                 FROM comment_reactions WHERE comment_id = ?1"
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "LIKE",
            ReactionKind::Dislike => "DISLIKE",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(ReactionKind::Like),
            "DISLIKE" => Ok(ReactionKind::Dislike),
            other => Err(StoreError::InvalidInput(format!(
                "Invalid reaction type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// Likes and dislikes for posts and comments, one vote per user per target.
#[derive(Clone)]
pub struct ReactionLedger {
    pool: DbPool,
}

impl ReactionLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Replace the user's reaction on a target. The delete and insert share one
    /// write transaction, so at most one row per (user, target) is ever visible.
    pub fn set(
        &self,
        user_id: i64,
        target: TargetKind,
        target_id: i64,
        kind: ReactionKind,
    ) -> StoreResult<()> {
        if user_id <= 0 || target_id <= 0 {
            return Err(StoreError::InvalidInput("Missing required fields".into()));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(target.delete_sql(), params![user_id, target_id])?;
        tx.execute(target.insert_sql(), params![user_id, target_id, kind.as_str()])
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::InvalidInput(format!("Unknown user or {}", target.as_str()))
                } else {
                    StoreError::Sql(e)
                }
            })?;
        tx.commit()?;

        tracing::info!(
            user_id,
            target = target.as_str(),
            target_id,
            reaction = kind.as_str(),
            "Reaction recorded"
        );
        Ok(())
    }

    /// The user's current reaction on a target, if any.
    pub fn get(
        &self,
        user_id: i64,
        target: TargetKind,
        target_id: i64,
    ) -> StoreResult<Option<ReactionKind>> {
        let conn = self.pool.get()?;
        let raw: Option<String> = conn
            .query_row(target.select_sql(), params![user_id, target_id], |row| {
                row.get(0)
            })
            .optional()?;
        raw.map(|s| s.parse()).transpose()
    }

    pub fn counts(&self, target: TargetKind, target_id: i64) -> StoreResult<ReactionCounts> {
        let conn = self.pool.get()?;
        let counts = conn.query_row(target.counts_sql(), params![target_id], |row| {
            Ok(ReactionCounts {
                likes: row.get(0)?,
                dislikes: row.get(1)?,
            })
        })?;
        Ok(counts)
    }
}
