use axum::routing::{get, post};
use axum::Router;

use crate::reactions::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add-reaction", post(handlers::add_reaction))
        .route("/reaction-counts", get(handlers::reaction_counts))
        .route("/commentreaction", post(handlers::comment_reaction))
        .route(
            "/commentreactioncounts",
            get(handlers::comment_reaction_counts),
        )
}
