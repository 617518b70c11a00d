//! HTTP handlers for the dealcast trigger surface.
//!
//! The marketplace calls the social-post endpoint after a deal is created;
//! the batch runs in a spawned task and the endpoint answers immediately.
//! Failures never surface here — they are recorded per connection.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;

/// Basic service identification returned from the root endpoint
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Root endpoint returning service information
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "dealcast",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness/readiness probe backed by a database round-trip
pub async fn healthz(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    crate::db::health_check(&state.db).await?;
    Ok(Json(json!({ "status": "ok" })))
}

#[derive(Debug, Deserialize)]
pub struct SocialPostTrigger {
    pub vendor_id: Uuid,
}

/// Fire-and-forget trigger: publish a freshly created deal to every eligible
/// social connection. Responds 202 immediately; the batch settles in the
/// background and its outcome lands in the post log.
pub async fn trigger_social_post(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
    Json(body): Json<SocialPostTrigger>,
) -> (StatusCode, Json<serde_json::Value>) {
    let post_manager = state.post_manager.clone();
    let vendor_id = body.vendor_id;

    tokio::spawn(async move {
        match post_manager.post_deal_to_social(deal_id, vendor_id).await {
            Ok(outcome) => {
                info!(deal_id = %deal_id, outcome = ?outcome, "Social post batch finished");
            }
            Err(err) => {
                error!(deal_id = %deal_id, error = ?err, "Social post batch failed");
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "deal_id": deal_id })),
    )
}
