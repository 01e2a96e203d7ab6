use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extractors::{JsonBody, MaybeUser, SessionCookie};
use crate::state::AppState;

// -- Request / response types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
}

#[derive(Serialize)]
pub struct SessionStatus {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// -- Cookie helpers --

/// Format a timestamp as an RFC 7231 HTTP date for cookie `Expires`.
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn session_cookie(name: &str, token: &str, expires_at: DateTime<Utc>) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Expires={}",
        name,
        token,
        http_date(expires_at)
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0",
        name
    )
}

// -- Handlers --

/// POST /register: create an account
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AppResult<Response> {
    state
        .users
        .register(&req.email, &req.username, &req.password)?;

    Ok((StatusCode::CREATED, "User registered successfully\n").into_response())
}

/// POST /login: check credentials and issue a session cookie
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Response> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    let (user_id, username) = state.users.authenticate(&req.email, &req.password)?;
    let session = state.sessions.create(user_id)?;
    tracing::info!(user_id, "User logged in");

    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &session.token,
        session.expires_at,
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Login successful".to_string(),
            username,
        }),
    )
        .into_response())
}

/// GET|POST /logout: revoke the session named by the cookie
pub async fn logout(
    State(state): State<AppState>,
    SessionCookie(token): SessionCookie,
) -> AppResult<Response> {
    state.sessions.revoke(&token)?;

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            clear_session_cookie(&state.config.auth.cookie_name),
        )],
        Json(serde_json::json!({ "message": "Logout successful" })),
    )
        .into_response())
}

/// GET /check-session: report whether the cookie names a live session
pub async fn check_session(MaybeUser(user): MaybeUser) -> Json<SessionStatus> {
    Json(SessionStatus {
        logged_in: user.is_some(),
        username: user.map(|u| u.username),
    })
}
