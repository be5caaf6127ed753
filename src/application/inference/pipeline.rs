//! Inference Pipeline
//!
//! 单个请求的完整流程：校验 → 参数解析 → 确保加载 → 获取闸门 →
//! 编码输入 → generate → 释放闸门 → 输出归一化

use std::sync::Arc;
use std::time::Instant;

use super::gate::GenerationGate;
use super::lifecycle::{EngineHandle, EngineLifecycle};
use crate::application::error::SynthesisError;
use crate::application::ports::{EngineInputs, GenerateOptions, GradientMode, RawSpeech};
use crate::domain::{
    AudioResult, GenerationDefaults, GenerationRequest, ResolvedParameters, SynthesisText,
    DEFAULT_SAMPLE_RATE,
};

/// 流水线配置
#[derive(Debug, Clone)]
pub struct InferencePipelineConfig {
    /// 文本字符数上限
    pub text_max_chars: usize,
    /// 默认生成参数
    pub defaults: GenerationDefaults,
}

impl Default for InferencePipelineConfig {
    fn default() -> Self {
        Self {
            text_max_chars: 4000,
            defaults: GenerationDefaults::default(),
        }
    }
}

/// 推理流水线
pub struct InferencePipeline {
    config: InferencePipelineConfig,
    lifecycle: Arc<EngineLifecycle>,
    gate: Arc<GenerationGate>,
}

impl InferencePipeline {
    pub fn new(
        config: InferencePipelineConfig,
        lifecycle: Arc<EngineLifecycle>,
        gate: Arc<GenerationGate>,
    ) -> Self {
        Self {
            config,
            lifecycle,
            gate,
        }
    }

    pub fn config(&self) -> &InferencePipelineConfig {
        &self.config
    }

    /// 执行一次合成
    pub async fn run(&self, request: &GenerationRequest) -> Result<AudioResult, SynthesisError> {
        let text = SynthesisText::parse(&request.text, self.config.text_max_chars)?;
        let params = self.config.defaults.resolve(request);

        let handle = self
            .lifecycle
            .ensure_loaded()
            .await
            .map_err(|e| SynthesisError::not_ready(e.to_string()))?;

        let raw = {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| SynthesisError::not_ready(e.to_string()))?;
            Self::generate(handle, &text, &params).await?
        };

        let (samples, channels) = normalize_speech(raw)?;
        let sample_rate = handle
            .processor()
            .sampling_rate()
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_SAMPLE_RATE);

        Ok(AudioResult {
            samples,
            sample_rate,
            channels,
        })
    }

    /// 闸门内的临界区
    async fn generate(
        handle: &EngineHandle,
        text: &SynthesisText,
        params: &ResolvedParameters,
    ) -> Result<RawSpeech, SynthesisError> {
        let device = handle.device();
        let inputs: EngineInputs = handle
            .processor()
            .encode(text.as_str(), params.voice.as_deref())?
            .into_iter()
            .map(|(name, value)| (name, value.to_device(device)))
            .collect();

        let options = GenerateOptions {
            cfg_scale: params.cfg_scale,
            max_new_tokens: params.max_tokens,
            gradients: GradientMode::Disabled,
        };

        tracing::debug!(
            chars = text.char_count(),
            voice = ?params.voice,
            cfg_scale = params.cfg_scale,
            max_tokens = params.max_tokens,
            device = %device,
            "Starting generation"
        );
        let started = Instant::now();

        let output = handle.engine().generate(inputs, options).await?;

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            outputs = output.speech_outputs.len(),
            "Generation finished"
        );

        output
            .speech_outputs
            .into_iter()
            .next()
            .ok_or_else(|| SynthesisError::generation("engine returned no speech output"))
    }
}

/// 把原始输出转成主机上的交错 f32 样本，去掉长度为 1 的维度
///
/// 一维视为单声道；二维按 (frames, channels) 解释
fn normalize_speech(raw: RawSpeech) -> Result<(Vec<f32>, u16), SynthesisError> {
    let (samples, shape) = raw.into_host_f32()?;
    let dims: Vec<usize> = shape.into_iter().filter(|&d| d != 1).collect();

    match dims.as_slice() {
        [] | [_] => Ok((samples, 1)),
        [_, channels] => {
            let channels = u16::try_from(*channels).map_err(|_| {
                SynthesisError::generation(format!("too many audio channels: {}", channels))
            })?;
            Ok((samples, channels))
        }
        _ => Err(SynthesisError::generation(format!(
            "unsupported speech output shape {:?}",
            dims
        ))),
    }
}
