use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::extractors::{bearer_token, constant_time_eq};
use crate::social;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cron/social-media", get(social_media))
}

/// Run one social aggregation pass over every configured campaign.
async fn social_media(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    if let Some(secret) = state.config.social.cron_secret.as_deref() {
        match bearer_token(&headers) {
            Some(token) if constant_time_eq(token, secret) => {}
            _ => return Err(AppError::Unauthorized),
        }
    }

    tracing::info!(
        campaigns = state.config.social.campaigns.len(),
        "Starting social media aggregation"
    );
    let report = social::aggregate(
        &state.posts,
        state.social.as_ref(),
        &state.config.social.campaigns,
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Social media aggregation complete. Added {} new posts.",
            report.total
        ),
        "results": report.per_campaign,
    })))
}
