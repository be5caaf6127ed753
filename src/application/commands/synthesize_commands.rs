//! Synthesize Commands

use uuid::Uuid;

use crate::domain::GenerationRequest;

/// 合成命令
#[derive(Debug, Clone)]
pub struct SynthesizeCommand {
    /// 请求 ID（用于日志和追踪）
    pub request_id: Uuid,
    pub request: GenerationRequest,
}

impl SynthesizeCommand {
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            request,
        }
    }
}

/// 合成响应
#[derive(Debug, Clone)]
pub struct SynthesizeResponse {
    pub request_id: Uuid,
    /// 编码后的音频
    pub audio_data: Vec<u8>,
    pub content_type: &'static str,
    pub sample_rate: u32,
    pub duration_ms: u64,
}
