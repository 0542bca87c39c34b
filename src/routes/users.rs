use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{CreateUserData, PublicUser, UpdateUserData};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::{blocking, Page};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(register))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let page = Page::new(query.limit, query.offset);
    let users: Vec<PublicUser> = state
        .users
        .get_all_users(page.limit, page.offset)?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    let total_count = state.users.get_user_count()?;

    Ok(Json(json!({
        "users": users,
        "totalCount": total_count,
        "limit": page.limit,
        "offset": page.offset,
    })))
}

async fn register(
    State(state): State<AppState>,
    Json(data): Json<CreateUserData>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    if data.username.trim().is_empty() || data.email.trim().is_empty() || data.password.is_empty()
    {
        return Err(AppError::BadRequest(
            "Username, email, and password are required".into(),
        ));
    }

    let users = state.users.clone();
    let user = blocking(move || users.create_user(data)).await??;

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.get_user_by_id(id)?.ok_or(AppError::NotFound)?;
    Ok(Json(user.into()))
}

async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<UpdateUserData>,
) -> AppResult<Json<PublicUser>> {
    if current.id() != id {
        return Err(AppError::Forbidden);
    }
    let user = state.users.update_user(id, data)?.ok_or(AppError::NotFound)?;
    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    if current.id() != id {
        return Err(AppError::Forbidden);
    }
    if !state.users.delete_user(id)? {
        return Err(AppError::NotFound);
    }
    tracing::info!(user_id = id, "Deleted user");
    Ok(Json(json!({ "success": true })))
}
