//! HTTP inbound adapter.
//!
//! Exposes the screenshot pipeline as a JSON endpoint plus a health probe.

use crate::application::ScreenshotService;
use crate::error::ScreenshotError;
use crate::ports::{FrameRenderer, ImageHost, ImageOptimizer, MediaProber};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct ScreenshotRequest {
    pub remote_path: String,
    #[serde(default)]
    pub content_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ScreenshotResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbcode: Option<String>,
}

impl ScreenshotResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            bbcode: None,
        }
    }
}

impl IntoResponse for ScreenshotError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScreenshotError::Resolve(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ScreenshotResponse::failure(self.to_string()))).into_response()
    }
}

pub fn router<P, R, O, H>(service: Arc<ScreenshotService<P, R, O, H>>) -> Router
where
    P: MediaProber + 'static,
    R: FrameRenderer + 'static,
    O: ImageOptimizer + 'static,
    H: ImageHost + 'static,
{
    Router::new()
        .route("/api/media/screenshot", post(screenshot::<P, R, O, H>))
        .route("/api/health", get(health))
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn screenshot<P, R, O, H>(
    State(service): State<Arc<ScreenshotService<P, R, O, H>>>,
    payload: Result<Json<ScreenshotRequest>, JsonRejection>,
) -> Result<Json<ScreenshotResponse>, Response>
where
    P: MediaProber + 'static,
    R: FrameRenderer + 'static,
    O: ImageOptimizer + 'static,
    H: ImageHost + 'static,
{
    let Json(request) = payload.map_err(|rejection| {
        (
            rejection.status(),
            Json(ScreenshotResponse::failure(rejection.body_text())),
        )
            .into_response()
    })?;

    if request.remote_path.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ScreenshotResponse::failure("remote_path is required")),
        )
            .into_response());
    }

    info!(
        remote_path = %request.remote_path,
        content_name = ?request.content_name,
        "screenshot request"
    );

    let mut rng = StdRng::from_os_rng();
    let report = service
        .take_screenshots(
            Path::new(&request.remote_path),
            request.content_name.as_deref(),
            &mut rng,
        )
        .await
        .map_err(|err| {
            error!(error = %err, "screenshot request failed");
            err.into_response()
        })?;

    Ok(Json(ScreenshotResponse {
        success: true,
        message: report.summary(),
        bbcode: Some(report.bbcode()),
    }))
}
