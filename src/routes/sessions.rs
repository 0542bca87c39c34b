use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::PublicUser;
use crate::error::{AppError, AppResult};
use crate::extractors::{BearerToken, CurrentUser};
use crate::routes::blocking;
use crate::state::AppState;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(login).delete(logout))
        .route("/api/sessions/validate", get(validate))
        .route("/api/sessions/extend", post(extend))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let users = state.users.clone();
    let user = blocking(move || users.verify_password(&req.email, &req.password))
        .await??
        .ok_or(AppError::Unauthorized)?;

    let session = state
        .sessions
        .create_session(user.id, state.config.auth.session_hours)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": PublicUser::from(user),
            "session": {
                "token": session.session_token,
                "expires_at": session.expires_at,
            },
        })),
    ))
}

async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<Value>> {
    if !state.sessions.delete_session(&token)? {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "message": "Session deleted successfully" })))
}

async fn validate(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<Value>> {
    let session = state
        .sessions
        .get_session_by_token(&token)?
        .ok_or(AppError::Unauthorized)?;
    let user = state
        .users
        .get_user_by_id(session.user_id)?
        .ok_or(AppError::NotFound)?;

    Ok(Json(json!({
        "valid": true,
        "user": PublicUser::from(user),
        "session": { "expires_at": session.expires_at },
    })))
}

/// Push the current session's expiry out by another full session lifetime.
async fn extend(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    let session = state
        .sessions
        .extend_session(&current.session.session_token, state.config.auth.session_hours)?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(json!({ "session": { "expires_at": session.expires_at } })))
}
