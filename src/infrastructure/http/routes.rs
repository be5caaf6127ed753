//! HTTP Routes
//!
//! API Endpoints:
//! - /healthz   GET   就绪状态（不触发加载）
//! - /v1/tts    POST  文本合成，返回 audio/wav

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/v1/tts", post(handlers::synthesize))
}
