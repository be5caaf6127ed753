//! TTS Handler
//!
//! POST /v1/tts：文本 → audio/wav

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use http::{header, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::SynthesizeCommand;
use crate::domain::GenerationRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub const HEADER_SESSION_ID: &str = "X-TTS-Session-Id";
pub const HEADER_SAMPLE_RATE: &str = "X-TTS-Sample-Rate";
pub const HEADER_DURATION_MS: &str = "X-TTS-Duration-Ms";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub cfg_scale: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
}

impl From<TtsRequest> for GenerationRequest {
    fn from(req: TtsRequest) -> Self {
        GenerationRequest {
            text: req.text,
            voice: req.voice,
            cfg_scale: req.cfg_scale,
            max_tokens: req.max_tokens,
        }
    }
}

pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let command = SynthesizeCommand::new(req.into());

    // 独立任务中执行：客户端断开不会中途取消生成，闸门许可随任务结束释放
    let handler = state.synthesize_handler.clone();
    let result = tokio::spawn(async move { handler.handle(command).await })
        .await
        .map_err(|e| ApiError::Internal(format!("TTS generation failed: {}", e)))??;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.audio_data.len())
        .header(HEADER_SESSION_ID, result.request_id.to_string())
        .header(HEADER_SAMPLE_RATE, result.sample_rate)
        .header(HEADER_DURATION_MS, result.duration_ms)
        .body(Body::from(result.audio_data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
