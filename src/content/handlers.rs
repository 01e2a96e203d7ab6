use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::models::{Category, Comment, Post};
use crate::error::AppResult;
use crate::extractors::{require_id, CurrentUser, JsonBody};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub categories: Vec<i64>,
}

#[derive(Serialize)]
pub struct CreatePostResponse {
    pub message: String,
    pub post_id: i64,
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    #[serde(default, alias = "postId")]
    pub post_id: i64,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub category_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentsQuery {
    pub post_id: Option<String>,
}

/// GET /posts
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(state.content.list_posts()?))
}

/// GET /categories
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.content.list_categories()?))
}

/// GET /category?category_id=
pub async fn posts_by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let category_id = require_id(query.category_id.as_deref(), "category_id")?;
    Ok(Json(state.content.list_posts_by_category(category_id)?))
}

/// POST /create-post: requires a session
pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<CreatePostRequest>,
) -> AppResult<Json<CreatePostResponse>> {
    let post_id = state
        .content
        .create_post(user.id, &req.title, &req.content, &req.categories)?;

    Ok(Json(CreatePostResponse {
        message: "Post created successfully".to_string(),
        post_id,
    }))
}

/// POST /comment: requires a session; the author is the session user
pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<AddCommentRequest>,
) -> AppResult<Json<Comment>> {
    let comment = state
        .content
        .add_comment(req.post_id, user.id, &req.content)?;
    Ok(Json(comment))
}

/// GET /get-comments?post_id=
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> AppResult<Json<Vec<Comment>>> {
    let post_id = require_id(query.post_id.as_deref(), "post_id")?;
    Ok(Json(state.content.list_comments(post_id)?))
}
