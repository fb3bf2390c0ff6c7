//! 피드 라우트 정의.

use axum::extract::State;
use axum::http::{header, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use seichi_stats_network::batch_buffer::BufferStats;

use crate::error::ApiError;
use crate::FeedState;

/// 텍스트 노출 형식 Content-Type
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// 헬스 응답
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub last_cycle: Option<DateTime<Utc>>,
    pub sample_count: usize,
    pub buffer: Option<BufferStats>,
}

/// 피드 라우터 생성
pub fn feed_routes() -> Router<FeedState> {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .fallback(not_found)
}

async fn metrics(State(state): State<FeedState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.feed.render(),
    )
}

async fn health(State(state): State<FeedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        last_cycle: state.feed.last_cycle(),
        sample_count: state.feed.sample_count(),
        buffer: state.buffer.as_ref().map(|b| b.stats()),
    })
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
