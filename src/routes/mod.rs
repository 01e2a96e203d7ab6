pub mod assets;
pub mod auth;
pub mod content;
pub mod home;
pub mod reactions;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application: every route, the 404 fallback and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/static/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(content::router())
        .merge(reactions::router())
        .fallback(home::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
