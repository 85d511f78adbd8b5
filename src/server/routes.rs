use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::job::{MergeKind, MergeRequest};
use crate::state::AppState;
use crate::workflow::MergeResponse;

const FEATURES: &[&str] = &[
    "video-merge",
    "image-slideshow",
    "background-music",
    "subtitles",
    "device-profiles",
];

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    message: String,
    timestamp: String,
    features: Vec<&'static str>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: format!("clipmerge running since {}", state.started_at.to_rfc3339()),
        timestamp: Utc::now().to_rfc3339(),
        features: FEATURES.to_vec(),
    })
}

pub async fn merge_videos(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<MergeResponse>, ApiError> {
    merge(state, MergeKind::Clips, payload).await
}

pub async fn merge_images(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<MergeResponse>, ApiError> {
    merge(state, MergeKind::Slideshow, payload).await
}

async fn merge(
    state: Arc<AppState>,
    kind: MergeKind,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<MergeResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let response = state.workflow.merge(kind, request).await?;
    Ok(Json(response))
}
