use axum::routing::{get, post};
use axum::Router;

use crate::content::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(handlers::list_posts))
        .route("/categories", get(handlers::list_categories))
        .route("/category", get(handlers::posts_by_category))
        .route("/create-post", post(handlers::create_post))
        .route("/comment", post(handlers::add_comment))
        .route("/get-comments", get(handlers::list_comments))
}
