pub mod cron;
pub mod events;
pub mod photos;
pub mod posts;
pub mod sessions;
pub mod upload;
pub mod uploads;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::db::models::DEFAULT_PAGE_SIZE;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MAX_PAGE_SIZE: i64 = 100;

/// All HTTP routes, with state applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(users::router())
        .merge(sessions::router())
        .merge(posts::router())
        .merge(photos::router())
        .merge(upload::router(state.config.storage.max_upload_bytes))
        .merge(uploads::router())
        .merge(events::router())
        .merge(cron::router())
        .with_state(state)
}

/// Resolved pagination window echoed back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

/// Run password hashing and other CPU-heavy work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))
}
