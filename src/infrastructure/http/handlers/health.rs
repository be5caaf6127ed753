//! Health Handler
//!
//! 只报告状态，不触发模型加载

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::application::HealthQuery;
use crate::infrastructure::http::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model: String,
    pub device: String,
}

pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = state.get_health_handler.handle(HealthQuery);

    Json(HealthResponse {
        ok: status.ready,
        model: status.model_id,
        device: status.device.to_string(),
    })
}
