//! Synthetic Engine - 内置的确定性合成后端
//!
//! 不加载神经网络权重，按输入文本生成确定性的正弦音调。
//! 用于在没有模型权重的环境下跑通完整链路（本地开发、集成测试、冒烟部署）。
//!
//! 模型 ID 解析：
//! - 本地目录：读取 `preprocessor_config.json` 中的 `sampling_rate` 和可选的 `voices` 列表
//! - 路径形式但目录不存在：加载失败
//! - 其它（hub 风格 ID）：使用默认处理器配置

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::ports::{
    EngineError, EngineInputs, EngineLoader, GenerateOptions, GenerationOutput, GradientMode,
    InputValue, RawSpeech, SpeechEngine, SpeechProcessor, Tensor,
};
use crate::domain::{DeviceSelection, Precision, DEFAULT_SAMPLE_RATE};

const PREPROCESSOR_CONFIG: &str = "preprocessor_config.json";
const BASE_PITCH_HZ: f32 = 220.0;
const FADE_SAMPLES: usize = 64;

/// Synthetic Engine 配置
#[derive(Debug, Clone)]
pub struct SyntheticEngineConfig {
    /// 处理器未声明采样率时使用的默认值
    pub sample_rate: u32,
    /// 每个生成 token 对应的样本数
    pub samples_per_token: u32,
    /// 模拟的推理延迟（毫秒）
    pub latency_ms: u64,
    /// 强制声明加速设备是否可用；None 时自动探测
    pub accelerator: Option<bool>,
}

impl Default for SyntheticEngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            samples_per_token: 960,
            latency_ms: 0,
            accelerator: None,
        }
    }
}

// ============================================================================
// Model source
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum ModelSource {
    Local(PathBuf),
    Hub(String),
}

impl ModelSource {
    fn resolve(model_id: &str) -> Result<Self, EngineError> {
        let trimmed = model_id.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Load("model id is empty".to_string()));
        }

        let path = Path::new(trimmed);
        if path.is_dir() {
            return Ok(Self::Local(path.to_path_buf()));
        }
        if looks_like_path(trimmed) {
            return Err(EngineError::Load(format!(
                "model directory not found: {}",
                trimmed
            )));
        }
        Ok(Self::Hub(trimmed.to_string()))
    }
}

fn looks_like_path(id: &str) -> bool {
    id.starts_with('/')
        || id.starts_with("./")
        || id.starts_with("../")
        || id.starts_with('~')
        || id.contains('\\')
}

/// `preprocessor_config.json` 中用到的字段
#[derive(Debug, Default, Deserialize)]
struct PreprocessorConfig {
    sampling_rate: Option<u32>,
    audio_processor: Option<AudioProcessorConfig>,
    voices: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct AudioProcessorConfig {
    sampling_rate: Option<u32>,
}

impl PreprocessorConfig {
    fn sampling_rate(&self) -> Option<u32> {
        self.audio_processor
            .as_ref()
            .and_then(|a| a.sampling_rate)
            .or(self.sampling_rate)
    }
}

async fn read_preprocessor_config(dir: &Path) -> Result<PreprocessorConfig, EngineError> {
    let path = dir.join(PREPROCESSOR_CONFIG);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(PreprocessorConfig::default());
    }
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| EngineError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| EngineError::Load(format!("{}: {}", path.display(), e)))
}

// ============================================================================
// Loader
// ============================================================================

/// 探测 CUDA 设备：CUDA_VISIBLE_DEVICES 为空或 -1 视为禁用
fn detect_accelerator() -> bool {
    if let Ok(visible) = std::env::var("CUDA_VISIBLE_DEVICES") {
        let visible = visible.trim();
        if visible.is_empty() || visible == "-1" {
            return false;
        }
    }
    Path::new("/dev/nvidia0").exists()
}

/// Synthetic Engine Loader
pub struct SyntheticEngineLoader {
    config: SyntheticEngineConfig,
    accelerator: bool,
}

impl SyntheticEngineLoader {
    pub fn new(config: SyntheticEngineConfig) -> Self {
        let accelerator = config.accelerator.unwrap_or_else(detect_accelerator);
        tracing::info!(
            accelerator,
            samples_per_token = config.samples_per_token,
            latency_ms = config.latency_ms,
            "SyntheticEngineLoader initialized"
        );
        Self {
            config,
            accelerator,
        }
    }
}

#[async_trait]
impl EngineLoader for SyntheticEngineLoader {
    fn accelerator_available(&self) -> bool {
        self.accelerator
    }

    async fn load_engine(
        &self,
        model_id: &str,
        device: DeviceSelection,
        precision: Precision,
    ) -> Result<Box<dyn SpeechEngine>, EngineError> {
        if device.is_accelerated() && !self.accelerator {
            return Err(EngineError::Device(format!(
                "device {} is not available",
                device
            )));
        }
        let source = ModelSource::resolve(model_id)?;
        tracing::debug!(source = ?source, device = %device, "Loading synthetic engine");

        Ok(Box::new(SyntheticEngine {
            device,
            precision,
            samples_per_token: self.config.samples_per_token.max(1) as usize,
            latency: Duration::from_millis(self.config.latency_ms),
            inference_mode: false,
            encoders_loaded: true,
        }))
    }

    async fn load_processor(&self, model_id: &str) -> Result<Box<dyn SpeechProcessor>, EngineError> {
        let preprocessor = match ModelSource::resolve(model_id)? {
            ModelSource::Local(dir) => read_preprocessor_config(&dir).await?,
            ModelSource::Hub(_) => PreprocessorConfig::default(),
        };

        Ok(Box::new(SyntheticProcessor {
            sampling_rate: preprocessor.sampling_rate().unwrap_or(self.config.sample_rate),
            voices: preprocessor.voices,
        }))
    }
}

// ============================================================================
// Processor
// ============================================================================

struct SyntheticProcessor {
    sampling_rate: u32,
    /// 已知音色；None 表示接受任意音色
    voices: Option<Vec<String>>,
}

/// 音色名 → 基频（110 ~ 330 Hz）
fn voice_pitch(voice: &str) -> f32 {
    // FNV-1a
    let hash = voice
        .bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
    110.0 + (hash % 220) as f32
}

impl SpeechProcessor for SyntheticProcessor {
    fn encode(&self, text: &str, voice: Option<&str>) -> Result<EngineInputs, EngineError> {
        if let (Some(voice), Some(known)) = (voice, &self.voices) {
            if !known.iter().any(|v| v == voice) {
                return Err(EngineError::InvalidInput(format!("unknown voice: {}", voice)));
            }
        }

        let ids: Vec<f32> = text.chars().map(|c| c as u32 as f32).collect();
        let len = ids.len();
        let input_ids = Tensor::new(ids, vec![1, len], DeviceSelection::Cpu, Precision::F32)?;

        let mut inputs = EngineInputs::new();
        inputs.insert("input_ids".to_string(), InputValue::Tensor(input_ids));
        inputs.insert(
            "voice".to_string(),
            InputValue::Value(voice.map(serde_json::Value::from).unwrap_or_default()),
        );
        inputs.insert(
            "voice_pitch".to_string(),
            InputValue::Value(serde_json::Value::from(
                voice.map(voice_pitch).unwrap_or(BASE_PITCH_HZ) as f64,
            )),
        );
        Ok(inputs)
    }

    fn sampling_rate(&self) -> Option<u32> {
        Some(self.sampling_rate)
    }
}

// ============================================================================
// Engine
// ============================================================================

struct SyntheticEngine {
    device: DeviceSelection,
    precision: Precision,
    samples_per_token: usize,
    latency: Duration,
    inference_mode: bool,
    encoders_loaded: bool,
}

impl SyntheticEngine {
    /// cfg 越大振幅越大，上限 0.5
    fn amplitude(cfg_scale: f64) -> f32 {
        (0.5 * cfg_scale / (1.0 + cfg_scale)) as f32
    }

    /// 每个 token 一段音调，频率由 token id 决定；段首尾淡入淡出避免爆音
    fn render(&self, ids: &[f32], tokens: usize, pitch: f32, amplitude: f32) -> Vec<f32> {
        let n = self.samples_per_token;
        let fade = FADE_SAMPLES.min(n / 2);
        let mut samples = Vec::with_capacity(tokens * n);

        for t in 0..tokens {
            let id = ids[t % ids.len()] as u32;
            let freq = pitch * (1.0 + (id % 12) as f32 / 12.0);
            let step = 2.0 * std::f32::consts::PI * freq / DEFAULT_SAMPLE_RATE as f32;
            for i in 0..n {
                let envelope = if i < fade {
                    i as f32 / fade as f32
                } else if i >= n - fade {
                    (n - i) as f32 / fade as f32
                } else {
                    1.0
                };
                samples.push((step * i as f32).sin() * amplitude * envelope);
            }
        }
        samples
    }
}

#[async_trait]
impl SpeechEngine for SyntheticEngine {
    fn set_inference_mode(&mut self) {
        self.inference_mode = true;
    }

    fn strip_encoders(&mut self) {
        self.encoders_loaded = false;
    }

    async fn generate(
        &self,
        inputs: EngineInputs,
        options: GenerateOptions,
    ) -> Result<GenerationOutput, EngineError> {
        if options.gradients == GradientMode::Enabled || !self.inference_mode {
            return Err(EngineError::Inference(
                "engine is not in inference mode".to_string(),
            ));
        }

        let ids = inputs
            .get("input_ids")
            .and_then(InputValue::as_tensor)
            .ok_or_else(|| EngineError::InvalidInput("missing input_ids".to_string()))?;
        if ids.device() != self.device {
            return Err(EngineError::Device(format!(
                "input_ids on {} but engine on {}",
                ids.device(),
                self.device
            )));
        }

        let pitch = match inputs.get("voice_pitch") {
            Some(InputValue::Value(v)) => v.as_f64().map(|p| p as f32).unwrap_or(BASE_PITCH_HZ),
            _ => BASE_PITCH_HZ,
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let tokens = if ids.data().is_empty() {
            0
        } else {
            ids.data().len().min(options.max_new_tokens as usize)
        };
        let samples = self.render(ids.data(), tokens, pitch, Self::amplitude(options.cfg_scale));
        let len = samples.len();

        tracing::debug!(
            tokens,
            samples = len,
            cfg_scale = options.cfg_scale,
            "Synthetic generation finished"
        );

        let speech = Tensor::new(samples, vec![1, len], self.device, self.precision)?;
        Ok(GenerationOutput {
            speech_outputs: vec![RawSpeech::Tensor(speech)],
        })
    }
}
