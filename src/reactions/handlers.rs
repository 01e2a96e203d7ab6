use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extractors::{require_id, CurrentUser, JsonBody, MaybeUser};
use crate::reactions::{ReactionKind, TargetKind};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddReactionRequest {
    #[serde(default, alias = "userId")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "postId")]
    pub post_id: Option<i64>,
    #[serde(default, alias = "commentId")]
    pub comment_id: Option<i64>,
    #[serde(default, alias = "type")]
    pub reaction_type: String,
}

#[derive(Deserialize)]
pub struct CommentReactionRequest {
    #[serde(default, alias = "userId")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "commentId")]
    pub comment_id: Option<i64>,
    #[serde(default, alias = "type")]
    pub reaction_type: String,
}

#[derive(Deserialize)]
pub struct PostIdQuery {
    pub post_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentIdQuery {
    pub comment_id: Option<String>,
}

#[derive(Serialize)]
pub struct PostReactionCounts {
    pub post_id: i64,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Serialize)]
pub struct CommentReactionCounts {
    pub comment_id: i64,
    pub likes: i64,
    pub dislikes: i64,
}

/// A live session names the voter; otherwise the body must.
fn resolve_voter(user: Option<CurrentUser>, body: Option<i64>) -> AppResult<i64> {
    user.map(|u| u.id)
        .or(body)
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("Missing required fields".into()))
}

fn parse_kind(raw: &str) -> AppResult<ReactionKind> {
    if raw.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".into()));
    }
    Ok(raw.parse()?)
}

fn record(
    state: &AppState,
    user_id: i64,
    target: TargetKind,
    target_id: i64,
    kind: ReactionKind,
) -> AppResult<Response> {
    state.reactions.set(user_id, target, target_id, kind)?;
    Ok((StatusCode::OK, "Reaction added successfully").into_response())
}

/// POST /add-reaction: vote on a post, or on a comment when only `comment_id` is given
pub async fn add_reaction(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    JsonBody(req): JsonBody<AddReactionRequest>,
) -> AppResult<Response> {
    let user_id = resolve_voter(user, req.user_id)?;
    let kind = parse_kind(&req.reaction_type)?;

    let (target, target_id) = match (req.post_id, req.comment_id) {
        (Some(post_id), None) => (TargetKind::Post, post_id),
        (None, Some(comment_id)) => (TargetKind::Comment, comment_id),
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "Provide either post_id or comment_id, not both".into(),
            ))
        }
        (None, None) => return Err(AppError::BadRequest("Missing required fields".into())),
    };

    record(&state, user_id, target, target_id, kind)
}

/// POST /commentreaction: vote on a comment
pub async fn comment_reaction(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    JsonBody(req): JsonBody<CommentReactionRequest>,
) -> AppResult<Response> {
    let user_id = resolve_voter(user, req.user_id)?;
    let comment_id = req
        .comment_id
        .ok_or_else(|| AppError::BadRequest("Missing required fields".into()))?;
    let kind = parse_kind(&req.reaction_type)?;

    record(&state, user_id, TargetKind::Comment, comment_id, kind)
}

/// GET /reaction-counts?post_id=
pub async fn reaction_counts(
    State(state): State<AppState>,
    Query(query): Query<PostIdQuery>,
) -> AppResult<Json<PostReactionCounts>> {
    let post_id = require_id(query.post_id.as_deref(), "post_id")?;
    let counts = state.reactions.counts(TargetKind::Post, post_id)?;

    Ok(Json(PostReactionCounts {
        post_id,
        likes: counts.likes,
        dislikes: counts.dislikes,
    }))
}

/// GET /commentreactioncounts?comment_id=
pub async fn comment_reaction_counts(
    State(state): State<AppState>,
    Query(query): Query<CommentIdQuery>,
) -> AppResult<Json<CommentReactionCounts>> {
    let comment_id = require_id(query.comment_id.as_deref(), "comment_id")?;
    let counts = state.reactions.counts(TargetKind::Comment, comment_id)?;

    Ok(Json(CommentReactionCounts {
        comment_id,
        likes: counts.likes,
        dislikes: counts.dislikes,
    }))
}
