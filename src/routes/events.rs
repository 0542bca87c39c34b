use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::models::{Event, Venue};
use crate::error::{AppError, AppResult};
use crate::routes::Page;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// An event with its venue inlined.
#[derive(Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub venue: Option<Venue>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/events/{id}", get(get_event))
        .route("/api/venues", get(list_venues))
        .route("/api/venues/{id}/events", get(venue_events))
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let page = Page::new(query.limit, query.offset);
    let events = state.events.get_events(page.limit, page.offset)?;
    Ok(Json(json!({
        "events": events,
        "limit": page.limit,
        "offset": page.offset,
    })))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<EventDetail>> {
    let event = state.events.get_event_by_id(id)?.ok_or(AppError::NotFound)?;
    let venue = state.venues.get_venue_by_id(event.venue_id)?;
    Ok(Json(EventDetail { event, venue }))
}

async fn list_venues(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let venues = state.venues.get_all_venues()?;
    Ok(Json(json!({ "venues": venues })))
}

async fn venue_events(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let venue = state.venues.get_venue_by_id(id)?.ok_or(AppError::NotFound)?;
    let page = Page::new(query.limit, query.offset);
    let events = state.events.get_events_by_venue(id, page.limit, page.offset)?;
    Ok(Json(json!({
        "venue": venue,
        "events": events,
        "limit": page.limit,
        "offset": page.offset,
    })))
}
