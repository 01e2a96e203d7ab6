use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db::models::Category;
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub username: Option<String>,
    pub categories: Vec<Category>,
    pub post_count: usize,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET /
pub async fn index(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> AppResult<Response> {
    let categories = state.content.list_categories()?;
    let post_count = state.content.list_posts()?.len();

    Ok(Html(HomeTemplate {
        username: user.map(|u| u.username),
        categories,
        post_count,
    })
    .into_response())
}

/// Anything the router does not know about.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
