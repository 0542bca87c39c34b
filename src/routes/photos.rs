use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{CreatePhotoData, Photo, UpdatePhotoData};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::Page;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    #[serde(rename = "eventId")]
    pub event_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Photo metadata as sent by clients. The owner is the session user.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CreatePhotoRequest {
    pub event_id: Option<i64>,
    pub blob_url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub genre: Option<String>,
    pub is_public: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/photos", get(list_photos).post(create_photo))
        .route(
            "/api/photos/{id}",
            get(get_photo).put(update_photo).delete(delete_photo),
        )
}

async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let page = Page::new(query.limit, query.offset);
    let search = query.search.filter(|s| !s.trim().is_empty());

    let photos = if let Some(search) = search {
        state.photos.search_photos(&search, page.limit, page.offset)?
    } else if let Some(genre) = query.genre {
        state.photos.get_photos_by_genre(&genre, page.limit, page.offset)?
    } else if let Some(event_id) = query.event_id {
        state
            .photos
            .get_photos_by_event(event_id, page.limit, page.offset)?
    } else {
        state.photos.get_all_photos(page.limit, page.offset)?
    };
    let total_count = state.photos.get_photo_count()?;

    Ok(Json(json!({
        "photos": photos,
        "totalCount": total_count,
        "limit": page.limit,
        "offset": page.offset,
    })))
}

async fn create_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreatePhotoRequest>,
) -> AppResult<(StatusCode, Json<Photo>)> {
    if req.blob_url.trim().is_empty() {
        return Err(AppError::BadRequest("Blob URL is required".into()));
    }
    let photo = state.photos.create_photo(CreatePhotoData {
        user_id: user.id(),
        event_id: req.event_id,
        blob_url: req.blob_url,
        caption: req.caption,
        alt_text: req.alt_text,
        genre: req.genre,
        is_public: req.is_public,
    })?;
    Ok((StatusCode::CREATED, Json(photo)))
}

async fn get_photo(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Photo>> {
    let photo = state.photos.get_photo_by_id(id)?.ok_or(AppError::NotFound)?;
    if !photo.is_public && user.as_ref().map(CurrentUser::id) != Some(photo.user_id) {
        return Err(AppError::NotFound);
    }
    Ok(Json(photo))
}

fn owned_photo(state: &AppState, user: &CurrentUser, id: i64) -> AppResult<Photo> {
    let photo = state.photos.get_photo_by_id(id)?.ok_or(AppError::NotFound)?;
    if photo.user_id != user.id() {
        return Err(AppError::Forbidden);
    }
    Ok(photo)
}

async fn update_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<UpdatePhotoData>,
) -> AppResult<Json<Photo>> {
    owned_photo(&state, &user, id)?;
    let photo = state.photos.update_photo(id, data)?.ok_or(AppError::NotFound)?;
    Ok(Json(photo))
}

async fn delete_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    owned_photo(&state, &user, id)?;
    if !state.photos.delete_photo(id)? {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "success": true })))
}
